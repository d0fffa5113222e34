//! Reference-counted route activation.
//!
//! Several usecases may share one physical route; the path applier only sees
//! the first enable and the last disable. Combo routes are never counted
//! themselves, their two halves are.

use std::thread;
use std::time::{Duration, Instant};

use crate::models::error::RouteError;
use crate::routing::catalog::Route;
use crate::traits::path_applier::PathApplier;

const ROUTE_COUNT: usize = Route::ALL.len();

pub struct RouteActivation {
    applier: Box<dyn PathApplier>,
    ref_counts: [u32; ROUTE_COUNT],
    debounce: Duration,
    last_disable: Option<Instant>,
}

impl RouteActivation {
    pub fn new(applier: Box<dyn PathApplier>, debounce: Duration) -> Self {
        Self {
            applier,
            ref_counts: [0; ROUTE_COUNT],
            debounce,
            last_disable: None,
        }
    }

    pub fn ref_count(&self, route: Route) -> u32 {
        self.ref_counts[route.index()]
    }

    /// Routes with a non-zero reference count, in catalog order.
    pub fn active_routes(&self) -> Vec<(Route, u32)> {
        Route::ALL
            .iter()
            .map(|route| (*route, self.ref_count(*route)))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn enable(&mut self, route: Route) {
        if let Some((first, second)) = route.combo_parts() {
            self.enable(first);
            self.enable(second);
            return;
        }

        let count = &mut self.ref_counts[route.index()];
        *count += 1;
        if *count > 1 {
            log::debug!("Route {} already active (refs {})", route, count);
            return;
        }

        self.settle();
        log::debug!("Enabling route {}", route);
        self.applier.apply(route.name());
    }

    /// Drops one reference. A route already at zero is a double disable and
    /// leaves the count untouched.
    pub fn disable(&mut self, route: Route) -> Result<(), RouteError> {
        if let Some((first, second)) = route.combo_parts() {
            let first_result = self.disable(first);
            let second_result = self.disable(second);
            return first_result.and(second_result);
        }

        let count = &mut self.ref_counts[route.index()];
        if *count == 0 {
            log::error!("Route {} disabled with reference count 0", route);
            return Err(RouteError::DoubleDisable(route));
        }

        *count -= 1;
        if *count == 0 {
            log::debug!("Disabling route {}", route);
            self.applier.unapply(route.name());
            self.last_disable = Some(Instant::now());
        }
        Ok(())
    }

    /// Waits out what remains of the debounce window since the last disable.
    fn settle(&self) {
        let Some(last) = self.last_disable else {
            return;
        };
        let elapsed = last.elapsed();
        if elapsed < self.debounce {
            let remaining = self.debounce - elapsed;
            log::debug!("Waiting {:?} for the mixer to settle", remaining);
            thread::sleep(remaining);
        }
    }
}
