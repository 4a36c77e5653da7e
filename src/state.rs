//! Mutable simulation state: trucks and orders.
//!
//! Node capacity/queue state lives with the node itself in [`crate::graph`];
//! this module only holds the entities the engine moves around the graph.

use serde::{Deserialize, Serialize};

pub type NodeId = String;
pub type TruckId = String;
pub type OrderId = String;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TruckStatus {
    Idle,
    EnRouteToPickup,
    EnRouteToDelivery,
    Resting,
}

impl TruckStatus {
    /// Whether this status represents "on the road toward something", as
    /// opposed to idle or resting.
    pub fn is_en_route(&self) -> bool {
        matches!(self, TruckStatus::EnRouteToPickup | TruckStatus::EnRouteToDelivery)
    }
}

/// A truck's full dynamic state. `route` always starts at `current_node_id`
/// while the truck is en route; it is empty while idle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Truck {
    pub id: TruckId,
    pub current_node_id: NodeId,
    pub route: Vec<NodeId>,
    pub current_node_index: usize,
    pub status: TruckStatus,
    pub driving_time_since_rest: f64,
    /// Status to restore once `end_rest` fires; `None` outside of resting.
    pub previous_status: Option<TruckStatus>,
    pub assigned_order_id: Option<OrderId>,
    pub current_leg_start_time: f64,
    pub current_leg_duration: f64,
}

impl Truck {
    pub fn spawn(id: TruckId, start_node: NodeId) -> Self {
        Truck {
            id,
            current_node_id: start_node,
            route: Vec::new(),
            current_node_index: 0,
            status: TruckStatus::Idle,
            driving_time_since_rest: 0.0,
            previous_status: None,
            assigned_order_id: None,
            current_leg_start_time: 0.0,
            current_leg_duration: 0.0,
        }
    }

    pub fn is_idle(&self) -> bool {
        self.status == TruckStatus::Idle
    }

    /// Whether the truck has more hops left to traverse on its current route.
    pub fn has_next_hop(&self) -> bool {
        !self.route.is_empty() && self.current_node_index < self.route.len() - 1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub origin_node_id: NodeId,
    pub destination_node_id: NodeId,
    pub creation_time: f64,
    pub status: OrderStatus,
}

impl Order {
    pub fn new(id: OrderId, origin: NodeId, destination: NodeId, creation_time: f64) -> Self {
        Order {
            id,
            origin_node_id: origin,
            destination_node_id: destination,
            creation_time,
            status: OrderStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spawned_truck_is_idle_with_empty_route() {
        let t = Truck::spawn("T1".into(), "N1".into());
        assert!(t.is_idle());
        assert!(t.route.is_empty());
        assert!(t.assigned_order_id.is_none());
    }

    #[test]
    fn has_next_hop_detects_last_leg() {
        let mut t = Truck::spawn("T1".into(), "A".into());
        t.route = vec!["A".into(), "B".into(), "C".into()];
        t.current_node_index = 0;
        assert!(t.has_next_hop());
        t.current_node_index = 2;
        assert!(!t.has_next_hop());
    }
}
