//! Two-phase route search
//!
//! Phase one builds a starting assignment by greedy cheapest insertion: the
//! unassigned booking with the lowest feasible insertion cost is placed at
//! its best position until nothing fits. Phase two improves it with a
//! large-neighborhood search: remove a few served bookings, reinsert
//! everything unassigned in random order, keep strict improvements. The
//! search runs under a wall-clock limit and an iteration budget and is
//! reproducible for a fixed seed and budget.

use std::collections::BTreeSet;
use std::time::{Duration, Instant};

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use tracing::debug;

use super::config::SolverConfig;
use super::constraints::{schedule_route, solution_cost, RouteSchedule};
use super::problem::Problem;

/// Bookings removed per improvement iteration, at most
const MAX_REMOVALS_PER_ITERATION: usize = 3;

/// The best assignment found by the search
#[derive(Debug, Clone)]
pub struct Assignment {
    /// Node sequence per vehicle, depot excluded
    pub routes: Vec<Vec<usize>>,
    /// Schedules matching `routes`; None for unused vehicles
    pub schedules: Vec<Option<RouteSchedule>>,
    /// Unserved booking indices, ascending
    pub dropped: Vec<usize>,
    /// Objective value of this assignment
    pub cost: i64,
}

/// One candidate position for a booking
#[derive(Debug, Clone, Copy)]
struct Insertion {
    vehicle: usize,
    pickup_pos: usize,
    delivery_pos: usize,
    cost: i64,
}

/// Working state of the search
#[derive(Debug, Clone)]
struct Plan {
    routes: Vec<Vec<usize>>,
    schedules: Vec<Option<RouteSchedule>>,
    unassigned: BTreeSet<usize>,
}

impl Plan {
    fn empty(problem: &Problem) -> Self {
        Self {
            routes: vec![Vec::new(); problem.vehicle_count()],
            schedules: vec![None; problem.vehicle_count()],
            unassigned: (0..problem.booking_count()).collect(),
        }
    }

    fn cost(&self, problem: &Problem) -> i64 {
        solution_cost(problem, &self.schedules, self.unassigned.len())
    }

    /// Cheapest feasible position for a booking across the fleet.
    /// Scan order is fixed, so ties resolve deterministically.
    fn best_insertion(&self, problem: &Problem, booking: usize) -> Option<Insertion> {
        let (pickup, delivery) = problem.pairs[booking];
        let mut best: Option<Insertion> = None;

        for vehicle in 0..problem.vehicle_count() {
            let route = &self.routes[vehicle];

            for pickup_pos in 0..=route.len() {
                for delivery_pos in pickup_pos + 1..=route.len() + 1 {
                    let mut candidate = route.clone();
                    candidate.insert(pickup_pos, pickup);
                    candidate.insert(delivery_pos, delivery);

                    let schedule =
                        match schedule_route(problem, &problem.fleet[vehicle], &candidate) {
                            Ok(schedule) => schedule,
                            Err(_) => continue,
                        };

                    let mut schedules = self.schedules.clone();
                    schedules[vehicle] = Some(schedule);
                    let cost =
                        solution_cost(problem, &schedules, self.unassigned.len() - 1);

                    if best.map(|b| cost < b.cost).unwrap_or(true) {
                        best = Some(Insertion {
                            vehicle,
                            pickup_pos,
                            delivery_pos,
                            cost,
                        });
                    }
                }
            }
        }

        best
    }

    fn apply_insertion(&mut self, problem: &Problem, booking: usize, insertion: Insertion) {
        let (pickup, delivery) = problem.pairs[booking];
        let route = &mut self.routes[insertion.vehicle];
        route.insert(insertion.pickup_pos, pickup);
        route.insert(insertion.delivery_pos, delivery);

        match schedule_route(problem, &problem.fleet[insertion.vehicle], route) {
            Ok(schedule) => {
                self.schedules[insertion.vehicle] = Some(schedule);
                self.unassigned.remove(&booking);
            }
            Err(violation) => {
                // The insertion was vetted; a failure here is a logic error
                debug!(?violation, booking, "vetted insertion became infeasible");
                route.remove(insertion.delivery_pos);
                route.remove(insertion.pickup_pos);
            }
        }
    }

    /// Take a served booking out of its route. Arrivals only move
    /// earlier-or-equal and loads shrink, but a matrix without the triangle
    /// inequality can still make the shortened route infeasible; in that
    /// case the removal is reverted.
    fn remove_booking(&mut self, problem: &Problem, booking: usize) -> bool {
        let (pickup, delivery) = problem.pairs[booking];

        for vehicle in 0..self.routes.len() {
            if !self.routes[vehicle].contains(&pickup) {
                continue;
            }

            let original = self.routes[vehicle].clone();
            self.routes[vehicle].retain(|&node| node != pickup && node != delivery);

            if self.routes[vehicle].is_empty() {
                self.schedules[vehicle] = None;
                self.unassigned.insert(booking);
                return true;
            }

            match schedule_route(problem, &problem.fleet[vehicle], &self.routes[vehicle]) {
                Ok(schedule) => {
                    self.schedules[vehicle] = Some(schedule);
                    self.unassigned.insert(booking);
                    return true;
                }
                Err(_) => {
                    self.routes[vehicle] = original;
                    return false;
                }
            }
        }

        false
    }

    /// Insert every unassigned booking at its best position, in the given order
    fn reinsert_all(&mut self, problem: &Problem, order: &[usize]) {
        for &booking in order {
            if !self.unassigned.contains(&booking) {
                continue;
            }
            if let Some(insertion) = self.best_insertion(problem, booking) {
                self.apply_insertion(problem, booking, insertion);
            }
        }
    }

    fn served(&self, problem: &Problem) -> Vec<usize> {
        (0..problem.booking_count())
            .filter(|b| !self.unassigned.contains(b))
            .collect()
    }

    fn into_assignment(self, problem: &Problem) -> Assignment {
        let cost = self.cost(problem);
        Assignment {
            routes: self.routes,
            schedules: self.schedules,
            dropped: self.unassigned.into_iter().collect(),
            cost,
        }
    }
}

/// Run the full search and return the best assignment seen.
/// Every returned assignment is feasible; bookings that fit nowhere are
/// dropped rather than forced in.
pub fn solve(problem: &Problem, config: &SolverConfig) -> Assignment {
    let started = Instant::now();
    let deadline = started + Duration::from_secs(config.max_time_seconds);

    let mut best = construct(problem);
    let mut best_cost = best.cost(problem);

    debug!(
        cost = best_cost,
        unassigned = best.unassigned.len(),
        "construction finished"
    );

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut iterations = 0usize;

    while iterations < config.max_iterations && Instant::now() < deadline {
        iterations += 1;

        let mut candidate = best.clone();

        let served = candidate.served(problem);
        if !served.is_empty() {
            let removals = 1 + rng.gen_range(0..served.len().min(MAX_REMOVALS_PER_ITERATION));
            let mut pool = served;
            pool.shuffle(&mut rng);
            for &booking in pool.iter().take(removals) {
                candidate.remove_booking(problem, booking);
            }
        } else if candidate.unassigned.is_empty() {
            break;
        }

        let mut pending: Vec<usize> = candidate.unassigned.iter().copied().collect();
        pending.shuffle(&mut rng);
        candidate.reinsert_all(problem, &pending);

        let candidate_cost = candidate.cost(problem);
        if candidate_cost < best_cost {
            best = candidate;
            best_cost = candidate_cost;
        }
    }

    debug!(
        cost = best_cost,
        iterations,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "search finished"
    );

    best.into_assignment(problem)
}

/// Greedy cheapest-insertion construction
fn construct(problem: &Problem) -> Plan {
    let mut plan = Plan::empty(problem);

    loop {
        let mut best: Option<(usize, Insertion)> = None;

        for &booking in &plan.unassigned {
            if let Some(insertion) = plan.best_insertion(problem, booking) {
                let better = best
                    .map(|(_, current)| insertion.cost < current.cost)
                    .unwrap_or(true);
                if better {
                    best = Some((booking, insertion));
                }
            }
        }

        match best {
            Some((booking, insertion)) => plan.apply_insertion(problem, booking, insertion),
            None => break,
        }
    }

    plan
}
