use crate::{
    error::StateError,
    problem::skill::Skills,
    solution::{
        activity::Activity,
        route::{RouteContext, VehicleRoute},
    },
    state::{state_key::SKILLS, state_store::StateStore},
    updaters::{state_updater::StateUpdater, visitor::ActivityVisitor},
};

/// Skills required anywhere on the route.
#[derive(Debug, Default)]
pub struct UpdateSkills {
    skills: Skills,
}

impl UpdateSkills {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActivityVisitor for UpdateSkills {
    fn begin(&mut self, _route: &VehicleRoute, _states: &mut StateStore) -> Result<(), StateError> {
        self.skills.clear();
        Ok(())
    }

    fn visit(
        &mut self,
        _route: &RouteContext<'_>,
        activity: &mut Activity,
        _states: &mut StateStore,
    ) -> Result<(), StateError> {
        self.skills
            .extend(activity.required_skills().iter().cloned());
        Ok(())
    }

    fn finish(
        &mut self,
        route: &mut VehicleRoute,
        states: &mut StateStore,
    ) -> Result<(), StateError> {
        let skills = std::mem::take(&mut self.skills);
        states.put_internal_route_state(route.id(), SKILLS, skills)
    }
}

impl StateUpdater for UpdateSkills {
    fn name(&self) -> &'static str {
        "update_skills"
    }

    fn as_forward_visitor(&mut self) -> Option<&mut dyn ActivityVisitor> {
        Some(self)
    }
}
