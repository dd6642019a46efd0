//! CSV booking ingestion
//!
//! Reads the dispatch system's ride export: `;`-separated, Dutch column
//! headers, local times as `dd-mm-YYYY HH:MM`. Coordinates are not part of
//! the export; bookings come out with placeholder coordinates and full
//! address strings for the geocoder.

use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::info;

use crate::types::{Booking, Coordinates};

/// One row of the ride export
#[derive(Debug, Deserialize)]
struct ExportRow {
    #[serde(rename = "Rit ID")]
    ride_id: String,
    #[serde(rename = "Tussenvoegsel Hoofdklant", default)]
    customer_infix: Option<String>,
    #[serde(rename = "Achternaam Hoofdklant", default)]
    customer_surname: Option<String>,
    #[serde(rename = "Passagiers", default)]
    passengers: Option<String>,
    #[serde(rename = "Rolstoelen", default)]
    wheelchairs: Option<String>,
    #[serde(rename = "Vertrektijd")]
    departure_time: String,
    #[serde(rename = "Vertrek Straat", default)]
    departure_street: Option<String>,
    #[serde(rename = "Vertrek Huisnummer", default)]
    departure_house_number: Option<String>,
    #[serde(rename = "Vertrek Postcode", default)]
    departure_postcode: Option<String>,
    #[serde(rename = "Vertrek Stad", default)]
    departure_city: Option<String>,
    #[serde(rename = "Aankomsttijd")]
    arrival_time: String,
    #[serde(rename = "Aankomst Straat", default)]
    arrival_street: Option<String>,
    #[serde(rename = "Aankomst Huisnummer", default)]
    arrival_house_number: Option<String>,
    #[serde(rename = "Aankomst Postcode", default)]
    arrival_postcode: Option<String>,
    #[serde(rename = "Aankomst Stad", default)]
    arrival_city: Option<String>,
}

/// Parse the ride export into bookings ready for geocoding.
pub fn read_bookings_csv(content: &[u8]) -> Result<Vec<Booking>> {
    if content.is_empty() {
        anyhow::bail!("CSV content is empty");
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .trim(csv::Trim::All)
        .from_reader(content);

    let mut bookings = Vec::new();

    for (line, row) in reader.deserialize::<ExportRow>().enumerate() {
        let row = row.with_context(|| format!("CSV row {} is malformed", line + 2))?;
        let booking = row_to_booking(row)
            .with_context(|| format!("CSV row {} has invalid values", line + 2))?;
        bookings.push(booking);
    }

    info!("Parsed {} bookings from CSV export", bookings.len());
    Ok(bookings)
}

fn row_to_booking(row: ExportRow) -> Result<Booking> {
    let pickup_time = parse_export_time(&row.departure_time)
        .with_context(|| format!("ride {}: bad departure time", row.ride_id))?;
    let delivery_time = parse_export_time(&row.arrival_time)
        .with_context(|| format!("ride {}: bad arrival time", row.ride_id))?;

    let customer = join_fields(&[row.customer_infix.as_deref(), row.customer_surname.as_deref()]);

    let pickup_address = join_fields(&[
        row.departure_street.as_deref(),
        row.departure_house_number.as_deref(),
        row.departure_postcode.as_deref(),
        row.departure_city.as_deref(),
    ]);
    let delivery_address = join_fields(&[
        row.arrival_street.as_deref(),
        row.arrival_house_number.as_deref(),
        row.arrival_postcode.as_deref(),
        row.arrival_city.as_deref(),
    ]);

    Ok(Booking {
        id: row.ride_id,
        customer,
        passengers: parse_count(row.passengers.as_deref())?,
        wheelchairs: parse_count(row.wheelchairs.as_deref())?,
        pickup_time,
        pickup_address,
        delivery_time,
        delivery_address,
        pickup: Some(Coordinates::zero()),
        delivery: Some(Coordinates::zero()),
    })
}

/// `dd-mm-YYYY HH:MM` local wall-clock time
fn parse_export_time(value: &str) -> Result<chrono::DateTime<chrono::FixedOffset>> {
    let naive = NaiveDateTime::parse_from_str(value.trim(), "%d-%m-%Y %H:%M")
        .with_context(|| format!("cannot parse '{}' as dd-mm-YYYY HH:MM", value))?;
    Ok(naive.and_utc().fixed_offset())
}

fn parse_count(value: Option<&str>) -> Result<u32> {
    match value {
        None => Ok(0),
        Some(raw) if raw.trim().is_empty() => Ok(0),
        Some(raw) => raw
            .trim()
            .parse()
            .with_context(|| format!("'{}' is not a passenger count", raw)),
    }
}

fn join_fields(fields: &[Option<&str>]) -> String {
    fields
        .iter()
        .filter_map(|f| *f)
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
Rit ID;Tussenvoegsel Hoofdklant;Achternaam Hoofdklant;Passagiers;Rolstoelen;Vertrektijd;Vertrek Straat;Vertrek Huisnummer;Vertrek Postcode;Vertrek Stad;Aankomsttijd;Aankomst Straat;Aankomst Huisnummer;Aankomst Postcode;Aankomst Stad
15706825;;Langelaar;2;;22-07-2025 07:21;Prinses Margrietstraat;15;3314NP;Dordrecht;22-07-2025 08:30;Catsheuvel;37;2517JZ;'s-Gravenhage
15927970;van;Dorst;0;2;22-07-2025 16:00;Zaagmolenstraat;47;2265XG;Leidschendam;22-07-2025 17:36;Overakkerstraat;105;4834XK;Breda
";

    #[test]
    fn test_read_sample_export() {
        let bookings = read_bookings_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(bookings.len(), 2);

        let first = &bookings[0];
        assert_eq!(first.id, "15706825");
        assert_eq!(first.customer, "Langelaar");
        assert_eq!(first.passengers, 2);
        assert_eq!(first.wheelchairs, 0);
        assert_eq!(first.pickup_seconds(), 7 * 3600 + 21 * 60);
        assert_eq!(
            first.pickup_address,
            "Prinses Margrietstraat 15 3314NP Dordrecht"
        );
        assert!(first.needs_pickup_geocoding());
    }

    #[test]
    fn test_customer_infix_joined() {
        let bookings = read_bookings_csv(SAMPLE.as_bytes()).unwrap();
        assert_eq!(bookings[1].customer, "van Dorst");
        assert_eq!(bookings[1].wheelchairs, 2);
    }

    #[test]
    fn test_empty_content_rejected() {
        assert!(read_bookings_csv(b"").is_err());
    }

    #[test]
    fn test_bad_time_format_rejected() {
        let csv = "\
Rit ID;Passagiers;Vertrektijd;Aankomsttijd
1;1;2025-07-22 07:21;22-07-2025 08:30
";
        let err = read_bookings_csv(csv.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("invalid values"));
    }

    #[test]
    fn test_missing_optional_columns() {
        let csv = "\
Rit ID;Passagiers;Vertrektijd;Aankomsttijd
7;3;22-07-2025 09:00;22-07-2025 10:15
";
        let bookings = read_bookings_csv(csv.as_bytes()).unwrap();
        assert_eq!(bookings[0].passengers, 3);
        assert_eq!(bookings[0].customer, "");
        assert_eq!(bookings[0].pickup_address, "");
    }

    #[test]
    fn test_parse_export_time_wall_clock() {
        let ts = parse_export_time("22-07-2025 16:05").unwrap();
        assert_eq!(ts.time().format("%H:%M").to_string(), "16:05");
    }
}
