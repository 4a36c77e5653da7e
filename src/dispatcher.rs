//! Order-to-truck matching.
//!
//! The dispatcher scans the pending-orders list in creation order and hands
//! each one to the first idle truck it finds, rather than optimizing
//! globally: a deliberately greedy, first-idle-truck, first-pending-order
//! strategy rather than e.g. nearest-truck assignment. See DESIGN.md for
//! the open question on dispatch strategy.

use crate::graph::Graph;
use crate::state::{Order, OrderStatus, Truck, TruckStatus};

/// The route a truck should take to fulfil an order: pickup leg followed by
/// delivery leg, with the shared boundary node deduplicated.
pub struct PlannedRoute {
    pub nodes: Vec<String>,
}

/// Plan a composite pickup-then-delivery route for a truck idling at
/// `truck_node_id` against `order`. Returns `None` if either leg has no
/// path, in which case the caller should cancel the order rather than
/// assign it.
pub fn plan_route(graph: &Graph, truck_node_id: &str, order: &Order) -> Option<PlannedRoute> {
    let to_pickup = graph.shortest_path(truck_node_id, &order.origin_node_id);
    if to_pickup.is_empty() {
        return None;
    }
    let to_delivery = graph.shortest_path(&order.origin_node_id, &order.destination_node_id);
    if to_delivery.is_empty() {
        return None;
    }

    let mut nodes = to_pickup;
    // `to_delivery` starts at the pickup node, which `nodes` already ends
    // with; skip that duplicate before appending.
    nodes.extend(to_delivery.into_iter().skip(1));

    if nodes.len() < 2 {
        return None;
    }
    Some(PlannedRoute { nodes })
}

/// Find the first idle truck, in map-iteration-independent (caller-sorted)
/// order: picks the lowest-id idle truck, i.e. the first one encountered
/// under a deterministic ordering.
pub fn find_idle_truck<'a>(trucks: impl Iterator<Item = &'a Truck>) -> Option<&'a Truck> {
    trucks.filter(|t| t.is_idle()).min_by(|a, b| a.id.cmp(&b.id))
}

/// Outcome of attempting to match one pending order against the idle fleet.
pub enum MatchOutcome {
    /// No idle truck is available; the order stays pending.
    NoIdleTruck,
    /// An idle truck exists but neither leg has a route; the order is
    /// cancelled rather than left pending forever.
    NoRoute { truck_id: String },
    /// A truck was committed to the order with the given route.
    Assigned { truck_id: String, route: PlannedRoute },
}

/// Attempt to match the head of the pending-orders queue (FIFO) against the
/// idle fleet. Does not mutate `order` or `trucks`; the caller applies the
/// outcome.
pub fn match_order<'a>(graph: &Graph, trucks: impl Iterator<Item = &'a Truck>, order: &Order) -> MatchOutcome {
    let Some(truck) = find_idle_truck(trucks) else {
        return MatchOutcome::NoIdleTruck;
    };
    match plan_route(graph, &truck.current_node_id, order) {
        Some(route) => MatchOutcome::Assigned {
            truck_id: truck.id.clone(),
            route,
        },
        None => MatchOutcome::NoRoute { truck_id: truck.id.clone() },
    }
}

/// Apply a successful match: flip the order to `Assigned` and the truck
/// onto its planned route, `EnRouteToPickup`.
pub fn commit_assignment(truck: &mut Truck, order: &mut Order, route: PlannedRoute) {
    truck.route = route.nodes;
    truck.current_node_index = 0;
    truck.status = TruckStatus::EnRouteToPickup;
    truck.assigned_order_id = Some(order.id.clone());
    order.status = OrderStatus::Assigned;
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn finds_lowest_id_idle_truck() {
        let mut a = Truck::spawn("T2".into(), "N1".into());
        let mut b = Truck::spawn("T1".into(), "N1".into());
        let c = Truck::spawn("T3".into(), "N1".into());
        a.status = TruckStatus::Idle;
        b.status = TruckStatus::Idle;
        let trucks = [a, b, c];
        let found = find_idle_truck(trucks.iter()).unwrap();
        assert_eq!(found.id, "T1");
    }

    #[test]
    fn no_idle_truck_yields_no_idle_truck_outcome() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let graph = Graph::build_random(8, 3, &mut rng).unwrap();
        let mut truck = Truck::spawn("T1".into(), graph.node_ids().next().unwrap().into());
        truck.status = TruckStatus::EnRouteToPickup;
        let order = Order::new(
            "O1".into(),
            graph.node_ids().next().unwrap().into(),
            graph.node_ids().nth(1).unwrap().into(),
            0.0,
        );
        let outcome = match_order(&graph, std::iter::once(&truck), &order);
        assert!(matches!(outcome, MatchOutcome::NoIdleTruck));
    }

    #[test]
    fn assigns_idle_truck_with_valid_route() {
        let mut rng = ChaCha8Rng::seed_from_u64(2);
        let graph = Graph::build_random(8, 3, &mut rng).unwrap();
        let ids: Vec<&str> = graph.node_ids().collect();
        let truck = Truck::spawn("T1".into(), ids[0].into());
        let order = Order::new("O1".into(), ids[0].into(), ids[ids.len() - 1].into(), 0.0);
        match match_order(&graph, std::iter::once(&truck), &order) {
            MatchOutcome::Assigned { truck_id, route } => {
                assert_eq!(truck_id, "T1");
                assert_eq!(route.nodes.first().unwrap(), ids[0]);
                assert_eq!(route.nodes.last().unwrap(), ids[ids.len() - 1]);
            }
            _ => panic!("expected an assignment"),
        }
    }

    #[test]
    fn no_route_across_disconnected_components_cancels_the_order() {
        let graph = crate::graph::disconnected_pair_fixture();
        let truck = Truck::spawn("T1".into(), "A".into());
        let order = Order::new("O1".into(), "A".into(), "C".into(), 0.0);

        let outcome = match_order(&graph, std::iter::once(&truck), &order);
        match outcome {
            MatchOutcome::NoRoute { truck_id } => assert_eq!(truck_id, "T1"),
            _ => panic!("expected NoRoute across disconnected components"),
        }
    }

    #[test]
    fn commit_assignment_updates_both_sides() {
        let mut truck = Truck::spawn("T1".into(), "A".into());
        let mut order = Order::new("O1".into(), "A".into(), "B".into(), 0.0);
        let route = PlannedRoute { nodes: vec!["A".into(), "B".into()] };
        commit_assignment(&mut truck, &mut order, route);
        assert_eq!(truck.status, TruckStatus::EnRouteToPickup);
        assert_eq!(truck.assigned_order_id.as_deref(), Some("O1"));
        assert_eq!(order.status, OrderStatus::Assigned);
    }
}
