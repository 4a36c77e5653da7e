//! The discrete-event simulation engine: a time-ordered loop over a
//! [`Scheduler`] that mutates truck/order/node state and appends every
//! popped event to an append-only log for later export.

use crate::delay::DelayModel;
use crate::dispatcher::{self, MatchOutcome};
use crate::event::{Event, EventKind, SYSTEM};
use crate::graph::Graph;
use crate::scheduler::Scheduler;
use crate::state::{Order, OrderId, OrderStatus, Truck, TruckId, TruckStatus};
use std::collections::{HashMap, VecDeque};

const REST_THRESHOLD_MINUTES: f64 = 480.0;
const REST_DURATION_MINUTES: f64 = 60.0;

/// Owns every piece of mutable simulation state. Graph topology is shared
/// read-only once built; everything else (trucks, orders, the event queue,
/// the processed-event log) lives here.
pub struct Engine {
    graph: Graph,
    scheduler: Scheduler,
    current_time: f64,
    trucks: HashMap<TruckId, Truck>,
    orders: HashMap<OrderId, Order>,
    pending_orders: VecDeque<OrderId>,
    processed_events: Vec<Event>,
    delay_model: DelayModel,
}

impl Engine {
    pub fn new(graph: Graph, delay_model: DelayModel) -> Self {
        Engine {
            graph,
            scheduler: Scheduler::new(),
            current_time: 0.0,
            trucks: HashMap::new(),
            orders: HashMap::new(),
            pending_orders: VecDeque::new(),
            processed_events: Vec::new(),
            delay_model,
        }
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    pub fn trucks(&self) -> &HashMap<TruckId, Truck> {
        &self.trucks
    }

    pub fn orders(&self) -> &HashMap<OrderId, Order> {
        &self.orders
    }

    pub fn processed_events(&self) -> &[Event] {
        &self.processed_events
    }

    /// Schedule a truck spawn at `time`, idle at `start_node`.
    pub fn spawn_truck(&mut self, truck_id: impl Into<TruckId>, start_node: impl Into<String>, time: f64) {
        let truck_id = truck_id.into();
        let start_node = start_node.into();
        self.schedule(Event::new(time, truck_id, start_node, EventKind::TruckSpawn));
    }

    /// Schedule an order creation at `time`.
    pub fn create_order(
        &mut self,
        order_id: impl Into<OrderId>,
        origin: impl Into<String>,
        destination: impl Into<String>,
        time: f64,
    ) {
        let order_id = order_id.into();
        let origin = origin.into();
        let destination = destination.into();
        self.schedule(Event::new(
            time,
            SYSTEM,
            origin.clone(),
            EventKind::OrderCreated { order_id, origin, destination },
        ));
    }

    fn schedule(&mut self, event: Event) {
        self.scheduler.push(event);
    }

    /// Pop and process exactly one event. Returns `false` if the queue was
    /// empty.
    pub fn step(&mut self) -> bool {
        let Some(event) = self.scheduler.pop() else {
            return false;
        };
        self.current_time = event.time;
        self.processed_events.push(event.clone());
        self.dispatch(event);
        true
    }

    /// Run until the queue drains or `current_time` reaches `duration`.
    pub fn run(&mut self, duration: f64) {
        while !self.scheduler.is_empty() && self.current_time < duration {
            if !self.step() {
                break;
            }
        }
    }

    fn dispatch(&mut self, event: Event) {
        log::debug!("dispatching {} for truck {} at node {}", event.kind.label(), event.truck_id, event.node_id);
        let truck_id = event.truck_id.clone();
        let node_id = event.node_id.clone();
        let time = event.time;
        match event.kind {
            EventKind::TruckSpawn => self.handle_truck_spawn(truck_id, node_id),
            EventKind::OrderCreated { order_id, origin, destination } => {
                self.handle_order_created(order_id, origin, destination, time)
            }
            EventKind::OrderAssigned { .. } => {}
            EventKind::ArrivalNode => self.handle_arrival_node(truck_id, node_id, time),
            EventKind::StartService => self.handle_start_service(truck_id, node_id, time),
            EventKind::EndService { .. } => self.handle_end_service(truck_id, node_id, time),
            EventKind::DepartNode => self.handle_depart_node(truck_id, node_id, time),
            EventKind::StartRest => self.handle_start_rest(truck_id, node_id, time),
            EventKind::EndRest { .. } => self.handle_end_rest(truck_id, node_id, time),
        }
    }

    fn handle_truck_spawn(&mut self, truck_id: TruckId, start_node: String) {
        self.trucks.insert(truck_id.clone(), Truck::spawn(truck_id, start_node));
        self.run_dispatcher();
    }

    fn handle_order_created(&mut self, order_id: OrderId, origin: String, destination: String, time: f64) {
        self.orders.insert(order_id.clone(), Order::new(order_id.clone(), origin, destination, time));
        self.pending_orders.push_back(order_id);
        self.run_dispatcher();
    }

    fn handle_arrival_node(&mut self, truck_id: TruckId, node_id: String, time: f64) {
        {
            let truck = self.trucks.get_mut(&truck_id).expect("arrival event for unknown truck");
            truck.current_node_id = node_id.clone();
            truck.current_leg_duration = 0.0;
            truck.current_leg_start_time = 0.0;
        }

        let node = self.graph.node_mut(&node_id).expect("arrival at unknown node");
        if node.has_free_slot() {
            self.schedule(Event::new(time, truck_id, node_id, EventKind::StartService));
        } else {
            node.queue.push_back(truck_id);
        }
    }

    fn handle_start_service(&mut self, truck_id: TruckId, node_id: String, time: f64) {
        let kind = {
            let node = self.graph.node_mut(&node_id).expect("start_service at unknown node");
            node.busy_count += 1;
            node.kind
        };
        let service_duration = self.delay_model.service_time(kind);
        self.schedule(Event::new(
            time + service_duration,
            truck_id,
            node_id,
            EventKind::EndService { service_duration },
        ));
    }

    fn handle_end_service(&mut self, truck_id: TruckId, node_id: String, time: f64) {
        {
            let node = self.graph.node_mut(&node_id).expect("end_service at unknown node");
            node.busy_count -= 1;
        }

        let assigned_order_id = self.trucks.get(&truck_id).and_then(|t| t.assigned_order_id.clone());

        if let Some(order_id) = assigned_order_id {
            let (is_pickup, is_delivery) = {
                let order = &self.orders[&order_id];
                let truck = &self.trucks[&truck_id];
                (
                    truck.status == TruckStatus::EnRouteToPickup && node_id == order.origin_node_id,
                    truck.status == TruckStatus::EnRouteToDelivery && node_id == order.destination_node_id,
                )
            };

            if is_delivery {
                {
                    let truck = self.trucks.get_mut(&truck_id).unwrap();
                    truck.status = TruckStatus::Idle;
                    truck.assigned_order_id = None;
                    truck.route.clear();
                    truck.current_node_index = 0;
                }
                self.orders.get_mut(&order_id).unwrap().status = OrderStatus::Completed;

                self.promote_queue_head(&node_id, time);
                // A completed delivery frees a truck; give it first shot at
                // the next pending order before returning.
                self.run_dispatcher();
                return;
            } else if is_pickup {
                self.trucks.get_mut(&truck_id).unwrap().status = TruckStatus::EnRouteToDelivery;
            }
        }

        let has_next_hop = self.trucks.get(&truck_id).is_some_and(|t| t.has_next_hop());
        if has_next_hop {
            self.schedule(Event::new(time, truck_id.clone(), node_id.clone(), EventKind::DepartNode));
        }

        self.promote_queue_head(&node_id, time);
    }

    /// If a truck is waiting at `node_id`'s queue, pop it and schedule its
    /// `start_service` at `time`.
    fn promote_queue_head(&mut self, node_id: &str, time: f64) {
        let next_truck = self
            .graph
            .node_mut(node_id)
            .expect("promote_queue_head at unknown node")
            .queue
            .pop_front();
        if let Some(next_truck_id) = next_truck {
            self.schedule(Event::new(time, next_truck_id, node_id.to_string(), EventKind::StartService));
        }
    }

    fn handle_depart_node(&mut self, truck_id: TruckId, node_id: String, time: f64) {
        let Some(truck) = self.trucks.get(&truck_id) else { return };
        if truck.route.is_empty() || truck.current_node_index >= truck.route.len() - 1 {
            return;
        }
        let next_node_id = truck.route[truck.current_node_index + 1].clone();

        let Some(edge) = self.graph.edge(&node_id, &next_node_id).expect("depart_node: unknown node id") else {
            log::warn!("truck {truck_id} stalled: no edge {node_id} -> {next_node_id}");
            return;
        };
        let base_travel_time = edge.base_travel_time;
        let travel_time = self.delay_model.travel_time(base_travel_time);

        let driving_time_since_rest = self.trucks[&truck_id].driving_time_since_rest;
        if driving_time_since_rest > 0.0 && driving_time_since_rest + travel_time > REST_THRESHOLD_MINUTES {
            self.schedule(Event::new(time, truck_id, node_id, EventKind::StartRest));
            return;
        }

        let truck = self.trucks.get_mut(&truck_id).unwrap();
        truck.current_node_index += 1;
        truck.driving_time_since_rest += travel_time;
        truck.current_leg_start_time = time;
        truck.current_leg_duration = travel_time;

        self.schedule(Event::new(time + travel_time, truck_id, next_node_id, EventKind::ArrivalNode));
    }

    fn handle_start_rest(&mut self, truck_id: TruckId, node_id: String, time: f64) {
        let truck = self.trucks.get_mut(&truck_id).expect("start_rest for unknown truck");
        truck.previous_status = Some(truck.status);
        truck.status = TruckStatus::Resting;

        self.schedule(Event::new(
            time + REST_DURATION_MINUTES,
            truck_id,
            node_id,
            EventKind::EndRest { rest_duration: REST_DURATION_MINUTES },
        ));
    }

    fn handle_end_rest(&mut self, truck_id: TruckId, node_id: String, time: f64) {
        {
            let truck = self.trucks.get_mut(&truck_id).expect("end_rest for unknown truck");
            truck.driving_time_since_rest = 0.0;
            truck.status = match truck.previous_status.take() {
                Some(status) if status.is_en_route() => status,
                _ => TruckStatus::Idle,
            };
        }
        self.schedule(Event::new(time, truck_id, node_id, EventKind::DepartNode));
    }

    /// FIFO dispatcher: match the head of `pending_orders` against the
    /// first idle truck and plan its composite route. No-op if there is no
    /// pending order or no idle truck.
    fn run_dispatcher(&mut self) {
        let Some(order_id) = self.pending_orders.front().cloned() else {
            return;
        };

        let outcome = {
            let order = &self.orders[&order_id];
            dispatcher::match_order(&self.graph, self.trucks.values(), order)
        };

        match outcome {
            MatchOutcome::NoIdleTruck => {}
            MatchOutcome::NoRoute { truck_id } => {
                self.pending_orders.pop_front();
                self.orders.get_mut(&order_id).unwrap().status = OrderStatus::Cancelled;
                log::warn!("order {order_id} cancelled: no route for idle truck {truck_id}");
            }
            MatchOutcome::Assigned { truck_id, route } => {
                self.pending_orders.pop_front();
                let route_len = route.nodes.len();
                let current_node_id = self.trucks[&truck_id].current_node_id.clone();

                {
                    let truck = self.trucks.get_mut(&truck_id).unwrap();
                    let order = self.orders.get_mut(&order_id).unwrap();
                    dispatcher::commit_assignment(truck, order, route);
                }

                let (origin, destination) = {
                    let order = &self.orders[&order_id];
                    (order.origin_node_id.clone(), order.destination_node_id.clone())
                };
                self.schedule(Event::new(
                    self.current_time,
                    truck_id.clone(),
                    current_node_id.clone(),
                    EventKind::OrderAssigned { order_id, origin, destination },
                ));

                if route_len >= 2 {
                    self.schedule(Event::new(self.current_time, truck_id, current_node_id, EventKind::DepartNode));
                }
            }
        }
    }
}
