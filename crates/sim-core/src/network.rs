//! Route network registry keyed by `origin-destination`.

use rust_decimal::Decimal;
use std::collections::BTreeMap;
use tracing::debug;

use crate::route::{validate_route, Route, RouteKey};
use crate::ValidationError;

/// Keyed collection of routes. Adding an existing key replaces the route.
#[derive(Clone, Debug, Default)]
pub struct RouteNetwork {
    routes: BTreeMap<RouteKey, Route>,
}

impl RouteNetwork {
    pub fn new(routes: Vec<Route>) -> Result<Self, ValidationError> {
        let mut network = RouteNetwork::default();
        for r in routes {
            network.upsert(r)?;
        }
        Ok(network)
    }

    /// Insert or replace a route, returning the one it replaced.
    pub fn upsert(&mut self, route: Route) -> Result<Option<Route>, ValidationError> {
        validate_route(&route)?;
        let key = route.key();
        let previous = self.routes.insert(key.clone(), route);
        debug!(route = %key, replaced = previous.is_some(), "route upserted");
        Ok(previous)
    }

    pub fn get(&self, origin: &str, destination: &str) -> Option<&Route> {
        self.routes.get(&RouteKey::new(origin, destination))
    }

    pub fn get_mut(&mut self, origin: &str, destination: &str) -> Option<&mut Route> {
        self.routes.get_mut(&RouteKey::new(origin, destination))
    }

    pub fn routes(&self) -> impl Iterator<Item = (&RouteKey, &Route)> {
        self.routes.iter()
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn suspended(&self) -> Vec<&Route> {
        self.routes.values().filter(|r| r.is_suspended()).collect()
    }

    /// Weekly profit over all routes, each priced with the seat count that
    /// `seats_for` assigns to it. Routes without seats contribute nothing.
    pub fn total_weekly_profit<F>(&self, seats_for: F) -> Decimal
    where
        F: Fn(&Route) -> Option<u32>,
    {
        self.routes
            .values()
            .filter_map(|r| seats_for(r).map(|seats| r.weekly_profit(seats)))
            .sum()
    }

    /// Routes with positive weekly profit under `seats_for`.
    pub fn profitable_routes<F>(&self, seats_for: F) -> Vec<&Route>
    where
        F: Fn(&Route) -> Option<u32>,
    {
        self.routes
            .values()
            .filter(|r| seats_for(r).is_some_and(|s| r.weekly_profit(s) > Decimal::ZERO))
            .collect()
    }

    /// Routes with zero or negative weekly profit under `seats_for`.
    pub fn unprofitable_routes<F>(&self, seats_for: F) -> Vec<&Route>
    where
        F: Fn(&Route) -> Option<u32>,
    {
        self.routes
            .values()
            .filter(|r| seats_for(r).is_some_and(|s| r.weekly_profit(s) <= Decimal::ZERO))
            .collect()
    }
}
