//! Event types.
//!
//! Represented as a tagged enum with typed payloads per variant, keeping a
//! common header (time, truck id, node id, sequence number) shared across
//! all variants rather than a single struct with a dynamic details map.

use crate::state::{NodeId, OrderId, TruckId};
use serde::{Deserialize, Serialize};

/// Sentinel truck id used by events that are not truck-specific
/// (order creation, order assignment bookkeeping).
pub const SYSTEM: &str = "SYSTEM";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum EventKind {
    TruckSpawn,
    OrderCreated {
        order_id: OrderId,
        origin: NodeId,
        destination: NodeId,
    },
    /// Emitted once the dispatcher commits a truck to an order; pure
    /// bookkeeping, recorded in the log but otherwise inert.
    OrderAssigned {
        order_id: OrderId,
        origin: NodeId,
        destination: NodeId,
    },
    ArrivalNode,
    StartService,
    EndService {
        service_duration: f64,
    },
    DepartNode,
    StartRest,
    EndRest {
        rest_duration: f64,
    },
}

impl EventKind {
    /// Stable label for logging and CSV export.
    pub fn label(&self) -> &'static str {
        match self {
            EventKind::TruckSpawn => "truck_spawn",
            EventKind::OrderCreated { .. } => "order_created",
            EventKind::OrderAssigned { .. } => "order_assigned",
            EventKind::ArrivalNode => "arrival_node",
            EventKind::StartService => "start_service",
            EventKind::EndService { .. } => "end_service",
            EventKind::DepartNode => "depart_node",
            EventKind::StartRest => "start_rest",
            EventKind::EndRest { .. } => "end_rest",
        }
    }
}

/// A single scheduled/processed event. Immutable once pushed onto the
/// scheduler; `seq` is assigned by the scheduler at push time and used
/// for deterministic FIFO tie-breaking among equal-time events.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub time: f64,
    pub truck_id: TruckId,
    pub node_id: NodeId,
    pub seq: u64,
    pub kind: EventKind,
}

impl Event {
    /// Construct an event with a placeholder sequence number; the
    /// scheduler overwrites it on push.
    pub fn new(time: f64, truck_id: impl Into<TruckId>, node_id: impl Into<NodeId>, kind: EventKind) -> Self {
        Event {
            time,
            truck_id: truck_id.into(),
            node_id: node_id.into(),
            seq: 0,
            kind,
        }
    }
}
