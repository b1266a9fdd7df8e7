use crate::{
    error::StateError,
    solution::{
        activity::Activity,
        route::{RouteContext, VehicleRoute},
    },
    state::state_store::StateStore,
};

/// Single pass over a route from the start anchor to the end anchor.
///
/// `begin` sees the route with its start anchor, `visit` is called once per
/// job activity in route order and `finish` handles the end anchor.
pub trait ActivityVisitor {
    fn begin(&mut self, route: &VehicleRoute, states: &mut StateStore) -> Result<(), StateError>;

    fn visit(
        &mut self,
        route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError>;

    fn finish(&mut self, route: &mut VehicleRoute, states: &mut StateStore)
    -> Result<(), StateError>;
}

/// Single pass over a route from the end anchor back to the start anchor.
///
/// `begin` sees the route with its end anchor, `visit` is called once per
/// job activity in reverse route order and `finish` handles the start anchor.
pub trait ReverseActivityVisitor {
    fn begin(&mut self, route: &VehicleRoute, states: &mut StateStore) -> Result<(), StateError>;

    fn visit(
        &mut self,
        route: &RouteContext<'_>,
        activity: &mut Activity,
        states: &mut StateStore,
    ) -> Result<(), StateError>;

    fn finish(&mut self, route: &mut VehicleRoute, states: &mut StateStore)
    -> Result<(), StateError>;
}

/// Runs every visitor over the route in one forward pass.
///
/// Each activity is handed to the visitors in order, so a visitor can read
/// what the visitors before it wrote for the same activity.
pub fn visit_forward(
    visitors: &mut [&mut dyn ActivityVisitor],
    route: &mut VehicleRoute,
    states: &mut StateStore,
) -> Result<(), StateError> {
    if visitors.is_empty() {
        return Ok(());
    }

    for visitor in visitors.iter_mut() {
        visitor.begin(route, states)?;
    }

    let (context, activities) = route.split_activities_mut();
    for activity in activities.iter_mut() {
        for visitor in visitors.iter_mut() {
            visitor.visit(&context, activity, states)?;
        }
    }

    for visitor in visitors.iter_mut() {
        visitor.finish(route, states)?;
    }

    Ok(())
}

/// Runs every visitor over the route in one backward pass.
pub fn visit_backward(
    visitors: &mut [&mut dyn ReverseActivityVisitor],
    route: &mut VehicleRoute,
    states: &mut StateStore,
) -> Result<(), StateError> {
    if visitors.is_empty() {
        return Ok(());
    }

    for visitor in visitors.iter_mut() {
        visitor.begin(route, states)?;
    }

    let (context, activities) = route.split_activities_mut();
    for activity in activities.iter_mut().rev() {
        for visitor in visitors.iter_mut() {
            visitor.visit(&context, activity, states)?;
        }
    }

    for visitor in visitors.iter_mut() {
        visitor.finish(route, states)?;
    }

    Ok(())
}
