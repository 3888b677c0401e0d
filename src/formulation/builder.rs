//! Constraint model for lot sizing with carried changeover states.

use std::sync::Arc;

use crate::engine::{
    AllowedAssignments, IndicatorEquality, IntVar, InversePermutation, LessThan, LinearExpr,
    Solver,
};
use crate::evaluation::ScheduleEvaluator;
use crate::models::{CarriedState, Instance, Production, Schedule};

use super::relations::{initial_state_table, item_table, transition_table};

/// Builds the constraint model of an [`Instance`].
///
/// Variables, per period `p` and slot `k`:
///
/// - `product[p]` in `[-1, P-1]`, what is produced (`-1` idle)
/// - `item[p]` in `[0, T-1]`, which slot is served
/// - `delivery[k]`, the period serving slot `k`; `[0, due]` for real items
/// - `state[p]` in `[-1, P-1]`, last active product (`-1` none yet)
/// - `transition_cost[p]`, one of the matrix costs or 0, paid between `p` and `p + 1`
///
/// # Examples
///
/// ```
/// use u_lotsizing::formulation::ModelBuilder;
/// use u_lotsizing::models::Instance;
///
/// let inst = Instance::new(3, 2, 1, vec![vec![1], vec![2]], vec![vec![0, 7], vec![9, 0]])
///     .unwrap();
/// let model = ModelBuilder::new(&inst).build();
/// assert_eq!(model.items().len(), 3);
/// assert_eq!(model.transition_costs().len(), 2);
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ModelBuilder<'a> {
    instance: &'a Instance,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(instance: &'a Instance) -> Self {
        Self { instance }
    }

    /// Declares all variables and constraints and sets the objective.
    ///
    /// No feasibility check happens here; an unsatisfiable instance fails
    /// during the first propagation.
    pub fn build(self) -> AcpModel<'a> {
        let inst = self.instance;
        let n = inst.num_periods();
        let num_products = inst.num_products() as i64;
        let last_slot = n as i64 - 1;
        let mut solver = Solver::new();

        let products = solver.new_var_array(n, Production::IDLE_CODE, num_products - 1, "product");
        let items = solver.new_var_array(n, 0, last_slot, "item");

        let due_dates = inst.item_due_dates();
        let item_to_product = inst.item_to_product();
        let mut deliveries: Vec<IntVar> = due_dates
            .iter()
            .enumerate()
            .map(|(k, &due)| solver.new_var(0, due as i64, format!("delivery[{k}]")))
            .collect();
        for k in 1..deliveries.len() {
            if item_to_product[k - 1] == item_to_product[k] {
                solver.post(LessThan::new(deliveries[k - 1], deliveries[k]));
            }
        }
        for k in due_dates.len()..n {
            deliveries.push(solver.new_var(0, last_slot, format!("delivery[{k}]")));
        }

        solver.post(InversePermutation::new(items.clone(), deliveries.clone()));

        let items_table = Arc::new(item_table(inst));
        for p in 0..n {
            solver.post(AllowedAssignments::new(
                vec![items[p], products[p]],
                Arc::clone(&items_table),
            ));
        }

        let states = solver.new_var_array(
            n,
            CarriedState::NO_STATE_CODE,
            num_products - 1,
            "state",
        );
        let transitions = Arc::new(transition_table(inst));
        // only costs some transition can take, however large they are
        let costs: Vec<i64> = transitions.iter().map(|t| t[4]).collect();
        let transition_costs: Vec<IntVar> = (0..n.saturating_sub(1))
            .map(|p| {
                solver.new_var_from_values(costs.iter().copied(), format!("transition_cost[{p}]"))
            })
            .collect();
        for p in 0..n.saturating_sub(1) {
            solver.post(AllowedAssignments::new(
                vec![
                    products[p],
                    states[p],
                    products[p + 1],
                    states[p + 1],
                    transition_costs[p],
                ],
                Arc::clone(&transitions),
            ));
        }

        solver.post(IndicatorEquality::new(
            states[0],
            CarriedState::NO_STATE_CODE,
            products[0],
            Production::IDLE_CODE,
        ));
        if n == 1 {
            // no transition row pins state[0] to the product made in period 0
            solver.post(AllowedAssignments::new(
                vec![products[0], states[0]],
                Arc::new(initial_state_table(inst)),
            ));
        }

        let rate = inst.inventory_cost();
        let total_due: i64 = due_dates.iter().map(|&d| d as i64).sum();
        let mut objective = LinearExpr::constant(rate * total_due);
        for &delivery in &deliveries[..due_dates.len()] {
            objective = objective.add_term(-rate, delivery);
        }
        for &cost in &transition_costs {
            objective = objective.add_term(1, cost);
        }
        solver.minimize(objective);

        tracing::info!(
            "Model: {} variables, {} constraints, {} item tuples, {} transition tuples, max changeover {}",
            solver.store().num_vars(),
            solver.num_constraints(),
            items_table.num_tuples(),
            transitions.num_tuples(),
            inst.max_transition_cost()
        );

        AcpModel {
            instance: inst,
            solver,
            products,
            items,
            deliveries,
            states,
            transition_costs,
        }
    }
}

/// A built model: the solver plus handles to every variable array.
#[derive(Debug)]
pub struct AcpModel<'a> {
    instance: &'a Instance,
    solver: Solver,
    products: Vec<IntVar>,
    items: Vec<IntVar>,
    deliveries: Vec<IntVar>,
    states: Vec<IntVar>,
    transition_costs: Vec<IntVar>,
}

impl<'a> AcpModel<'a> {
    pub fn instance(&self) -> &'a Instance {
        self.instance
    }

    pub fn solver(&self) -> &Solver {
        &self.solver
    }

    pub fn solver_mut(&mut self) -> &mut Solver {
        &mut self.solver
    }

    /// `product[p]` per period.
    pub fn products(&self) -> &[IntVar] {
        &self.products
    }

    /// `item[p]` per period; the search decides these.
    pub fn items(&self) -> &[IntVar] {
        &self.items
    }

    /// `delivery[k]` per slot.
    pub fn deliveries(&self) -> &[IntVar] {
        &self.deliveries
    }

    /// `state[p]` per period.
    pub fn states(&self) -> &[IntVar] {
        &self.states
    }

    /// `transition_cost[p]` between periods `p` and `p + 1`.
    pub fn transition_costs(&self) -> &[IntVar] {
        &self.transition_costs
    }

    /// Objective once every term is fixed.
    pub fn objective_value(&self) -> Option<i64> {
        self.solver.objective_value()
    }

    /// Current `item[]` values if all are fixed.
    pub fn item_values(&self) -> Option<Vec<usize>> {
        self.items
            .iter()
            .map(|&v| self.solver.store().value(v).map(|x| x as usize))
            .collect()
    }

    /// Reads the current assignment as a [`Schedule`].
    pub fn extract_schedule(&self) -> Option<Schedule> {
        let items = self.item_values()?;
        match ScheduleEvaluator::new(self.instance).build(&items) {
            Ok(schedule) => Some(schedule),
            Err(violations) => {
                tracing::warn!("Assignment violates {} rule(s)", violations.len());
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{DepthFirstSearch, MinSizeMinValue, NoOpMonitor, SearchOutcome};
    use crate::fixtures;
    use u_numflow::random::create_rng;

    fn construct(model: &mut AcpModel<'_>) -> SearchOutcome {
        let items = model.items().to_vec();
        let mut rng = create_rng(0);
        DepthFirstSearch::new().solve(
            model.solver_mut(),
            MinSizeMinValue::new(items),
            &mut rng,
            &mut NoOpMonitor,
        )
    }

    fn value(model: &AcpModel<'_>, var: IntVar) -> i64 {
        model.solver().store().value(var).expect("fixed")
    }

    #[test]
    fn test_variable_counts() {
        let inst = fixtures::load(fixtures::SAMPLE);
        let model = ModelBuilder::new(&inst).build();
        assert_eq!(model.products().len(), 15);
        assert_eq!(model.items().len(), 15);
        assert_eq!(model.deliveries().len(), 15);
        assert_eq!(model.states().len(), 15);
        assert_eq!(model.transition_costs().len(), 14);
    }

    #[test]
    fn test_delivery_domains() {
        let inst = fixtures::load(fixtures::SMALL);
        let model = ModelBuilder::new(&inst).build();
        let store = model.solver().store();
        // items: p0 due 2, p0 due 5, p1 due 3, p1 due 4, then two idle slots
        let maxima: Vec<i64> = model.deliveries().iter().map(|&d| store.max(d)).collect();
        assert_eq!(maxima, vec![2, 5, 3, 4, 5, 5]);
    }

    #[test]
    fn test_construction_is_feasible() {
        for text in [fixtures::SMALL, fixtures::SAMPLE] {
            let inst = fixtures::load(text);
            let mut model = ModelBuilder::new(&inst).build();
            assert_eq!(construct(&mut model), SearchOutcome::Solution);

            let schedule = model.extract_schedule().expect("feasible schedule");
            assert_eq!(model.objective_value(), Some(schedule.objective()));
            for p in 0..inst.num_periods() {
                assert_eq!(value(&model, model.products()[p]), schedule.products()[p].code());
                assert_eq!(value(&model, model.states()[p]), schedule.states()[p].code());
            }
            for (p, &c) in schedule.transition_costs().iter().enumerate() {
                assert_eq!(value(&model, model.transition_costs()[p]), c);
            }
        }
    }

    #[test]
    fn test_items_and_deliveries_are_inverse() {
        let inst = fixtures::load(fixtures::SAMPLE);
        let mut model = ModelBuilder::new(&inst).build();
        assert_eq!(construct(&mut model), SearchOutcome::Solution);
        let items: Vec<i64> = model.items().iter().map(|&v| value(&model, v)).collect();
        let deliveries: Vec<i64> = model.deliveries().iter().map(|&v| value(&model, v)).collect();
        for p in 0..items.len() {
            assert_eq!(deliveries[items[p] as usize], p as i64);
            assert_eq!(items[deliveries[p] as usize], p as i64);
        }
    }

    #[test]
    fn test_initial_state_matches_first_product() {
        let inst = fixtures::load(fixtures::SMALL);
        let mut model = ModelBuilder::new(&inst).build();
        let (state0, product0) = (model.states()[0], model.products()[0]);

        model.solver_mut().push_frame();
        model.solver_mut().assign(product0, -1).unwrap();
        model.solver_mut().propagate().unwrap();
        assert_eq!(model.solver().store().value(state0), Some(-1));
        model.solver_mut().pop_frame();

        model.solver_mut().push_frame();
        model.solver_mut().assign(product0, 1).unwrap();
        model.solver_mut().propagate().unwrap();
        assert_eq!(model.solver().store().value(state0), Some(1));
        model.solver_mut().pop_frame();
    }

    #[test]
    fn test_large_costs_keep_small_domains() {
        let text = "6\n2\n0 0 1 0 0 1\n0 0 0 1 1 0\n2\n0 50000000\n30000000 0\n";
        let inst = fixtures::load(text);
        let mut model = ModelBuilder::new(&inst).build();
        for &cost in model.transition_costs() {
            let domain = model.solver().store().domain(cost);
            assert_eq!(domain.iter().collect::<Vec<_>>(), vec![0, 30_000_000, 50_000_000]);
        }

        assert_eq!(construct(&mut model), SearchOutcome::Solution);
        let schedule = model.extract_schedule().expect("feasible schedule");
        assert_eq!(model.objective_value(), Some(schedule.objective()));
        assert!(schedule.transition_cost() >= 30_000_000);
    }

    #[test]
    fn test_single_period_instance() {
        let inst = Instance::new(1, 2, 4, vec![vec![], vec![0]], vec![vec![0, 1], vec![1, 0]])
            .expect("valid");
        let mut model = ModelBuilder::new(&inst).build();
        assert_eq!(construct(&mut model), SearchOutcome::Solution);
        assert_eq!(value(&model, model.states()[0]), 1);
        assert_eq!(model.objective_value(), Some(0));
    }

    #[test]
    fn test_late_only_instance_is_infeasible() {
        // one item per product, both due in period 0
        let inst = Instance::new(2, 2, 1, vec![vec![0], vec![0]], vec![vec![0, 1], vec![1, 0]])
            .expect("valid");
        let mut model = ModelBuilder::new(&inst).build();
        assert_eq!(construct(&mut model), SearchOutcome::Exhausted);
    }
}
