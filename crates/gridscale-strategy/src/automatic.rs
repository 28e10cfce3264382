//! Automatic scale strategy — rule-driven capacity planning.

use std::time::Instant;

use tracing::{debug, info};

use gridscale_core::{
    CapacityRequirements, CapacityRequirementsPerZones, ProcessingUnitSchema, RecoveryState,
    ScaleStrategyConfig, ZonesConfig,
};
use gridscale_events::{ProgressChannel, ProgressCondition};
use gridscale_sla::{
    AutoScalingEndpoint, AutoScalingOutcome, AutoScalingSlaPolicy, ContainersEndpoint,
    ContainersSlaPolicy, MachinePoolSettings, MachinesEndpoint, MachinesSlaPolicy, PendingReason,
    RebalancingEndpoint, RebalancingSlaPolicy, ScaleDirection,
};

use crate::controller::ScaleStrategy;
use crate::cooldown::CooldownValidator;
use crate::progress::ProgressEvents;

/// Called after the planned capacity changes, e.g. to re-register
/// statistics monitors against the new machine set.
pub type PlanListener = Box<dyn FnMut(&CapacityRequirementsPerZones) + Send>;

/// Keeps planned capacity near actual load.
///
/// Each tick first pushes the current plan through the capacity pipeline
/// (machines, containers, rebalancing), then lets the auto-scaling
/// endpoint evaluate its rules per zone-set against the last fully
/// enforced capacity. A threshold breach updates the plan, clamped into
/// the configured window; a cooldown after each change keeps the plan
/// from oscillating. Rule evaluation never runs against a plan that is
/// still being applied without a baseline to fall back to.
pub struct AutomaticScaleStrategy {
    schema: ProcessingUnitSchema,
    pool: MachinePoolSettings,
    config: ScaleStrategyConfig,
    planned: CapacityRequirementsPerZones,
    /// The plan last known to be fully enforced; rule evaluation runs
    /// against this, not against an in-flight plan.
    enforced: Option<CapacityRequirementsPerZones>,
    cooldown: CooldownValidator,
    recovery: RecoveryState,
    machines: Box<dyn MachinesEndpoint>,
    containers: Box<dyn ContainersEndpoint>,
    rebalancing: Box<dyn RebalancingEndpoint>,
    autoscaling: Box<dyn AutoScalingEndpoint>,
    plan_listener: Option<PlanListener>,
}

impl AutomaticScaleStrategy {
    pub fn new(
        schema: ProcessingUnitSchema,
        pool: MachinePoolSettings,
        config: ScaleStrategyConfig,
        machines: Box<dyn MachinesEndpoint>,
        containers: Box<dyn ContainersEndpoint>,
        rebalancing: Box<dyn RebalancingEndpoint>,
        autoscaling: Box<dyn AutoScalingEndpoint>,
    ) -> Self {
        let mut planned = CapacityRequirementsPerZones::new();
        planned.set(
            ZonesConfig::AnyZones,
            config.clamp(config.initial_capacity, &ZonesConfig::AnyZones),
        );
        let cooldown = CooldownValidator::new(
            config.cooldown_after_scale_out(),
            config.cooldown_after_scale_in(),
        );
        Self {
            schema,
            pool,
            config,
            planned,
            enforced: None,
            cooldown,
            recovery: RecoveryState::NotRecovered,
            machines,
            containers,
            rebalancing,
            autoscaling,
            plan_listener: None,
        }
    }

    pub fn with_plan_listener(mut self, listener: PlanListener) -> Self {
        self.plan_listener = Some(listener);
        self
    }

    pub fn planned_capacity(&self) -> &CapacityRequirementsPerZones {
        &self.planned
    }

    fn machines_pool(&self) -> MachinePoolSettings {
        let mut pool = self.pool;
        pool.min_machines = pool.min_machines.max(self.schema.minimum_machines());
        pool
    }

    /// Push the current plan through machines, containers, and
    /// rebalancing.
    ///
    /// `Err` means the whole cycle must stop now (stale plan, or a
    /// pending condition with no enforced baseline to evaluate rules
    /// against). `Ok(Some(reason))` means the application is still
    /// converging but rule evaluation may proceed on the enforced
    /// baseline.
    fn apply_capacity(
        &mut self,
        events: &mut ProgressEvents,
    ) -> Result<Option<PendingReason>, PendingReason> {
        let has_baseline = self.enforced.is_some();
        let mut remembered: Option<PendingReason> = None;

        let plan: Vec<(ZonesConfig, CapacityRequirements)> = self
            .planned
            .iter()
            .map(|(zones, capacity)| (zones.clone(), *capacity))
            .collect();

        let mut machines_converged = true;
        for (zones, capacity) in plan {
            let policy = MachinesSlaPolicy::capacity(self.machines_pool(), capacity, zones);
            if let Err(reason) = self.machines.enforce(&policy) {
                machines_converged = false;
                triage(reason, has_baseline, &mut remembered)?;
            }
        }
        if machines_converged {
            events.report_completed(ProgressChannel::Machines);
        }

        let containers_policy = ContainersSlaPolicy {
            allocated: self.machines.allocated_capacity(),
            container_memory_mb: self.pool.container_memory_mb,
        };
        match self.containers.enforce(&containers_policy) {
            Ok(()) => events.report_completed(ProgressChannel::Containers),
            Err(reason) => triage(reason, has_baseline, &mut remembered)?,
        }

        match self.rebalancing.enforce(&RebalancingSlaPolicy {
            schema: self.schema,
        }) {
            Ok(()) => events.report_completed(ProgressChannel::Instances),
            Err(reason) => triage(reason, has_baseline, &mut remembered)?,
        }

        if remembered.is_none() {
            self.enforced = Some(self.planned.clone());
        }
        Ok(remembered)
    }

    /// One rule pass over every planned zone-set. Returns the assembled
    /// next plan and the per-zone pending conditions.
    fn evaluate_rules(
        &mut self,
        events: &mut ProgressEvents,
    ) -> (CapacityRequirementsPerZones, Vec<(ZonesConfig, String)>) {
        let zone_sets: Vec<ZonesConfig> = if self.planned.is_empty() {
            vec![ZonesConfig::AnyZones]
        } else {
            self.planned.zones().cloned().collect()
        };

        let mut next_plan = CapacityRequirementsPerZones::new();
        let mut per_zone: Vec<(ZonesConfig, String)> = Vec::new();

        for zones in zone_sets {
            let current = self.planned.zones_capacity_or_zero(&zones);
            let baseline = self
                .enforced
                .as_ref()
                .map(|enforced| enforced.zones_capacity_or_zero(&zones))
                .unwrap_or(current);

            let policy = AutoScalingSlaPolicy {
                enforced_capacity: baseline,
                min_capacity: self.config.min_for(&zones),
                max_capacity: self.config.max_for(&zones),
                rules: self.config.rules.clone(),
                zones: zones.clone(),
            };

            match self.autoscaling.enforce(&policy) {
                Ok(AutoScalingOutcome::NoChange) => {
                    next_plan.set(zones, current);
                    events.report_completed(ProgressChannel::AutoScaling);
                }
                Ok(AutoScalingOutcome::ThresholdBreached {
                    direction,
                    new_capacity,
                    reason,
                }) => {
                    let clamped = self.config.clamp(new_capacity, &zones);
                    info!(
                        zones = %zones,
                        direction = ?direction,
                        capacity = %clamped,
                        reason = %reason,
                        "auto-scaling decision"
                    );
                    events.report_in_progress(
                        ProgressChannel::AutoScaling,
                        &ProgressCondition::decision(&reason).with_zones(zones.clone()),
                    );
                    next_plan.set(zones, clamped);
                }
                Err(reason) => {
                    // Keep the previous plan for this zone-set.
                    next_plan.set(zones.clone(), current);
                    per_zone.push((zones, reason.to_string()));
                }
            }
        }

        (next_plan, per_zone)
    }
}

impl ScaleStrategy for AutomaticScaleStrategy {
    fn enforce_sla(&mut self, events: &mut ProgressEvents) -> Result<(), PendingReason> {
        let pending_application = self.apply_capacity(events)?;

        let now = Instant::now();
        if let Err(cooldown) = self.cooldown.validate(now) {
            debug!(reason = %cooldown, "skipping rule evaluation");
            return Err(pending_application.unwrap_or(cooldown));
        }

        let (next_plan, per_zone) = self.evaluate_rules(events);

        let plan_changed = next_plan != self.planned;
        if plan_changed {
            let old_total = self.planned.total();
            let new_total = next_plan.total();
            info!(
                previous = %self.planned,
                planned = %next_plan,
                "planned capacity changed"
            );
            self.planned = next_plan;
            // A pure redistribution across zone-sets arms no cooldown.
            if new_total.greater_than(&old_total) {
                self.cooldown.record_change(ScaleDirection::Up, now);
            } else if old_total.greater_than(&new_total) {
                self.cooldown.record_change(ScaleDirection::Down, now);
            }
            if let Some(listener) = &mut self.plan_listener {
                listener(&self.planned);
            }
        }

        // In-flight capacity application outranks rule-pass pendings.
        if let Some(reason) = pending_application {
            return Err(reason);
        }
        if !per_zone.is_empty() {
            return Err(PendingReason::AutoScalingInProgress { per_zone });
        }
        if plan_changed {
            // Start converging toward the new plan within this tick.
            return match self.apply_capacity(events)? {
                Some(reason) => Err(reason),
                None => Ok(()),
            };
        }
        Ok(())
    }

    fn recovered_state(&self) -> RecoveryState {
        self.recovery
    }

    fn recover_state(&mut self) -> anyhow::Result<()> {
        let allocated = self.machines.allocated_capacity();
        if !allocated.is_zero() {
            info!(allocated = %allocated, "recovered planned capacity from allocation");
            self.planned = allocated.clone();
            self.enforced = Some(allocated);
        }
        self.recovery = RecoveryState::Succeeded;
        Ok(())
    }
}

/// Classify a pending condition from the capacity-application pipeline.
///
/// A stale plan or a mid-flight stage aborts the cycle outright. Anything
/// else aborts only when no enforced baseline exists yet; with a baseline
/// it is remembered and the pipeline keeps going.
fn triage(
    reason: PendingReason,
    has_baseline: bool,
    remembered: &mut Option<PendingReason>,
) -> Result<(), PendingReason> {
    match reason {
        PendingReason::MachinesPlanChanged
        | PendingReason::ContainersInProgress
        | PendingReason::RebalancingInProgress => Err(reason),
        _ if !has_baseline => Err(reason),
        _ => {
            remembered.get_or_insert(reason);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    use gridscale_core::AutoScalingRule;
    use gridscale_events::{EventKind, RecordingSink};

    struct ScriptedMachines {
        responses: VecDeque<Result<(), PendingReason>>,
        allocated: CapacityRequirementsPerZones,
        policies: Arc<Mutex<Vec<MachinesSlaPolicy>>>,
    }

    impl MachinesEndpoint for ScriptedMachines {
        fn enforce(&mut self, policy: &MachinesSlaPolicy) -> Result<(), PendingReason> {
            self.policies.lock().unwrap().push(policy.clone());
            self.responses.pop_front().unwrap_or(Ok(()))
        }

        fn allocated_capacity(&self) -> CapacityRequirementsPerZones {
            self.allocated.clone()
        }
    }

    struct AlwaysOkContainers;

    impl ContainersEndpoint for AlwaysOkContainers {
        fn enforce(&mut self, _policy: &ContainersSlaPolicy) -> Result<(), PendingReason> {
            Ok(())
        }
    }

    struct AlwaysOkRebalancing;

    impl RebalancingEndpoint for AlwaysOkRebalancing {
        fn enforce(&mut self, _policy: &RebalancingSlaPolicy) -> Result<(), PendingReason> {
            Ok(())
        }
    }

    struct ScriptedAutoScaling {
        responses: VecDeque<Result<AutoScalingOutcome, PendingReason>>,
        policies: Arc<Mutex<Vec<AutoScalingSlaPolicy>>>,
    }

    impl AutoScalingEndpoint for ScriptedAutoScaling {
        fn enforce(
            &mut self,
            policy: &AutoScalingSlaPolicy,
        ) -> Result<AutoScalingOutcome, PendingReason> {
            self.policies.lock().unwrap().push(policy.clone());
            self.responses
                .pop_front()
                .unwrap_or(Ok(AutoScalingOutcome::NoChange))
        }
    }

    fn test_pool() -> MachinePoolSettings {
        MachinePoolSettings {
            min_machines: 1,
            max_machines: 10,
            container_memory_mb: 512,
            max_containers_per_machine: 4,
            dedicated_machines: false,
        }
    }

    fn test_schema() -> ProcessingUnitSchema {
        ProcessingUnitSchema {
            partitions: 2,
            backups_per_partition: 0,
            max_instances_per_machine: 0,
        }
    }

    fn cpu_rule() -> AutoScalingRule {
        AutoScalingRule {
            statistic: "cpu-percent".to_string(),
            low_threshold: 20.0,
            high_threshold: 80.0,
            increase: CapacityRequirements::machines(1),
            decrease: CapacityRequirements::machines(1),
        }
    }

    fn test_config(cooldown_secs: u64) -> ScaleStrategyConfig {
        ScaleStrategyConfig {
            min_capacity: CapacityRequirements::machines(1),
            max_capacity: CapacityRequirements::machines(5),
            initial_capacity: CapacityRequirements::machines(2),
            rules: vec![cpu_rule()],
            cooldown_after_scale_out_secs: cooldown_secs,
            cooldown_after_scale_in_secs: cooldown_secs,
            ..Default::default()
        }
    }

    struct Harness {
        strategy: AutomaticScaleStrategy,
        events: ProgressEvents,
        sink: Arc<RecordingSink>,
        machines_policies: Arc<Mutex<Vec<MachinesSlaPolicy>>>,
        autoscaling_policies: Arc<Mutex<Vec<AutoScalingSlaPolicy>>>,
    }

    fn harness(
        config: ScaleStrategyConfig,
        machines: Vec<Result<(), PendingReason>>,
        autoscaling: Vec<Result<AutoScalingOutcome, PendingReason>>,
    ) -> Harness {
        let machines_policies = Arc::new(Mutex::new(vec![]));
        let autoscaling_policies = Arc::new(Mutex::new(vec![]));
        let strategy = AutomaticScaleStrategy::new(
            test_schema(),
            test_pool(),
            config,
            Box::new(ScriptedMachines {
                responses: machines.into(),
                allocated: CapacityRequirementsPerZones::new(),
                policies: machines_policies.clone(),
            }),
            Box::new(AlwaysOkContainers),
            Box::new(AlwaysOkRebalancing),
            Box::new(ScriptedAutoScaling {
                responses: autoscaling.into(),
                policies: autoscaling_policies.clone(),
            }),
        );
        let sink = Arc::new(RecordingSink::new());
        let events = ProgressEvents::new("pu-1", false, sink.clone());
        Harness {
            strategy,
            events,
            sink,
            machines_policies,
            autoscaling_policies,
        }
    }

    fn planned_machines(strategy: &AutomaticScaleStrategy) -> u32 {
        strategy
            .planned_capacity()
            .zones_capacity_or_zero(&ZonesConfig::AnyZones)
            .machines
    }

    #[test]
    fn initial_plan_is_clamped_initial_capacity() {
        let mut config = test_config(0);
        config.initial_capacity = CapacityRequirements::machines(9);
        let h = harness(config, vec![], vec![]);

        // Max is 5 machines.
        assert_eq!(planned_machines(&h.strategy), 5);
    }

    #[test]
    fn no_change_keeps_the_plan_and_converges() {
        let mut h = harness(
            test_config(0),
            vec![Ok(())],
            vec![Ok(AutoScalingOutcome::NoChange)],
        );

        let result = h.strategy.enforce_sla(&mut h.events);

        assert_eq!(result, Ok(()));
        assert_eq!(planned_machines(&h.strategy), 2);
        // Rule evaluation ran against the just-enforced baseline.
        let policies = h.autoscaling_policies.lock().unwrap();
        assert_eq!(
            policies[0].enforced_capacity,
            CapacityRequirements::machines(2)
        );
    }

    #[test]
    fn threshold_breach_grows_the_plan_and_reapplies() {
        // 2 machines enforced, cpu at 90% breaches the 80% threshold.
        let mut h = harness(
            test_config(0),
            vec![Ok(()), Ok(())],
            vec![Ok(AutoScalingOutcome::ThresholdBreached {
                direction: ScaleDirection::Up,
                new_capacity: CapacityRequirements::machines(3),
                reason: "cpu-percent 90.0 above high threshold 80.0".to_string(),
            })],
        );

        let result = h.strategy.enforce_sla(&mut h.events);

        assert_eq!(result, Ok(()));
        assert_eq!(planned_machines(&h.strategy), 3);

        // The second machines call converges toward the new plan.
        let policies = h.machines_policies.lock().unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(
            policies[1].target,
            gridscale_sla::MachinesSlaTarget::Capacity {
                capacity: CapacityRequirements::machines(3)
            }
        );

        // The decision surfaced as an auto-scaling event.
        let decision = h
            .sink
            .events()
            .into_iter()
            .find(|e| e.kind == EventKind::Decision)
            .unwrap();
        assert_eq!(decision.channel, ProgressChannel::AutoScaling);
        assert!(decision.message.unwrap().contains("cpu-percent"));
    }

    #[test]
    fn breached_capacity_is_clamped_into_the_window() {
        let mut h = harness(
            test_config(0),
            vec![Ok(()), Ok(())],
            vec![Ok(AutoScalingOutcome::ThresholdBreached {
                direction: ScaleDirection::Up,
                new_capacity: CapacityRequirements::machines(50),
                reason: "runaway".to_string(),
            })],
        );

        h.strategy.enforce_sla(&mut h.events).unwrap();

        assert_eq!(planned_machines(&h.strategy), 5);
    }

    #[test]
    fn cooldown_blocks_rule_evaluation_and_keeps_the_plan() {
        let mut h = harness(
            test_config(60),
            vec![Ok(()), Ok(()), Ok(())],
            vec![Ok(AutoScalingOutcome::ThresholdBreached {
                direction: ScaleDirection::Up,
                new_capacity: CapacityRequirements::machines(3),
                reason: "cpu high".to_string(),
            })],
        );

        // First tick changes the plan and starts the cooldown.
        h.strategy.enforce_sla(&mut h.events).unwrap();
        assert_eq!(planned_machines(&h.strategy), 3);

        // Second tick is inside the 60s window: pending, plan unchanged,
        // no further rule evaluation.
        let result = h.strategy.enforce_sla(&mut h.events);
        match result {
            Err(PendingReason::CooldownActive { remaining }) => {
                assert!(remaining <= Duration::from_secs(60));
                assert!(remaining > Duration::ZERO);
            }
            other => panic!("expected cooldown, got {other:?}"),
        }
        assert_eq!(planned_machines(&h.strategy), 3);
        assert_eq!(h.autoscaling_policies.lock().unwrap().len(), 1);
    }

    #[test]
    fn application_pending_outranks_rule_pass_pending() {
        let mut h = harness(
            test_config(0),
            vec![Ok(()), Err(PendingReason::MachinesInProgress)],
            vec![
                Ok(AutoScalingOutcome::NoChange),
                Err(PendingReason::AutoScalingInProgress { per_zone: vec![] }),
            ],
        );

        // First tick establishes the enforced baseline.
        h.strategy.enforce_sla(&mut h.events).unwrap();

        // Second tick: machines are mid-flight and the rule pass is also
        // pending. The application pending wins.
        let result = h.strategy.enforce_sla(&mut h.events);
        assert_eq!(result, Err(PendingReason::MachinesInProgress));
    }

    #[test]
    fn rule_pass_pending_is_combined_per_zone() {
        let mut h = harness(
            test_config(0),
            vec![Ok(()), Ok(())],
            vec![
                Ok(AutoScalingOutcome::NoChange),
                Err(PendingReason::ContainersInProgress),
            ],
        );

        h.strategy.enforce_sla(&mut h.events).unwrap();
        let result = h.strategy.enforce_sla(&mut h.events);

        match result {
            Err(PendingReason::AutoScalingInProgress { per_zone }) => {
                assert_eq!(per_zone.len(), 1);
                assert_eq!(per_zone[0].0, ZonesConfig::AnyZones);
            }
            other => panic!("expected auto-scaling pending, got {other:?}"),
        }
        // The plan is untouched while the decision is pending.
        assert_eq!(planned_machines(&h.strategy), 2);
    }

    #[test]
    fn pending_without_baseline_aborts_before_rules_run() {
        let mut h = harness(
            test_config(0),
            vec![Err(PendingReason::MachinesInProgress)],
            vec![],
        );

        let result = h.strategy.enforce_sla(&mut h.events);

        assert_eq!(result, Err(PendingReason::MachinesInProgress));
        assert!(h.autoscaling_policies.lock().unwrap().is_empty());
    }

    #[test]
    fn stale_plan_aborts_even_with_a_baseline() {
        let mut h = harness(
            test_config(0),
            vec![Ok(()), Err(PendingReason::MachinesPlanChanged)],
            vec![Ok(AutoScalingOutcome::NoChange)],
        );

        h.strategy.enforce_sla(&mut h.events).unwrap();
        let result = h.strategy.enforce_sla(&mut h.events);

        assert_eq!(result, Err(PendingReason::MachinesPlanChanged));
    }

    #[test]
    fn plan_listener_fires_on_change_only() {
        let calls = Arc::new(Mutex::new(0u32));
        let listener_calls = calls.clone();
        let h = harness(
            test_config(0),
            vec![Ok(()), Ok(()), Ok(())],
            vec![
                Ok(AutoScalingOutcome::ThresholdBreached {
                    direction: ScaleDirection::Up,
                    new_capacity: CapacityRequirements::machines(3),
                    reason: "cpu high".to_string(),
                }),
                Ok(AutoScalingOutcome::NoChange),
            ],
        );
        let mut strategy = h.strategy.with_plan_listener(Box::new(move |_| {
            *listener_calls.lock().unwrap() += 1;
        }));
        let mut events = ProgressEvents::new("pu-1", false, Arc::new(RecordingSink::new()));

        strategy.enforce_sla(&mut events).unwrap();
        strategy.enforce_sla(&mut events).unwrap();

        assert_eq!(*calls.lock().unwrap(), 1);
    }

    fn recovered_harness(
        config: ScaleStrategyConfig,
        allocated: CapacityRequirementsPerZones,
        autoscaling: Vec<Result<AutoScalingOutcome, PendingReason>>,
    ) -> (AutomaticScaleStrategy, Arc<Mutex<Vec<AutoScalingSlaPolicy>>>) {
        let autoscaling_policies = Arc::new(Mutex::new(vec![]));
        let mut strategy = AutomaticScaleStrategy::new(
            test_schema(),
            test_pool(),
            config,
            Box::new(ScriptedMachines {
                responses: VecDeque::new(),
                allocated,
                policies: Arc::new(Mutex::new(vec![])),
            }),
            Box::new(AlwaysOkContainers),
            Box::new(AlwaysOkRebalancing),
            Box::new(ScriptedAutoScaling {
                responses: autoscaling.into(),
                policies: autoscaling_policies.clone(),
            }),
        );
        strategy.recover_state().unwrap();
        (strategy, autoscaling_policies)
    }

    #[test]
    fn zone_set_scaled_to_zero_is_still_evaluated() {
        let zone_a = ZonesConfig::exact(["a"]);
        let mut allocated = CapacityRequirementsPerZones::new();
        allocated.set(zone_a.clone(), CapacityRequirements::machines(1));

        // Zero minimum: a scale-in decision may take the zone to zero.
        let config = ScaleStrategyConfig {
            rules: vec![cpu_rule()],
            ..Default::default()
        };
        let (mut strategy, policies) = recovered_harness(
            config,
            allocated,
            vec![Ok(AutoScalingOutcome::ThresholdBreached {
                direction: ScaleDirection::Down,
                new_capacity: CapacityRequirements::ZERO,
                reason: "cpu-percent 5.0 below low threshold 20.0".to_string(),
            })],
        );
        let mut events = ProgressEvents::new("pu-1", false, Arc::new(RecordingSink::new()));

        strategy.enforce_sla(&mut events).unwrap();
        assert_eq!(
            strategy
                .planned_capacity()
                .zones_capacity_or_zero(&zone_a),
            CapacityRequirements::ZERO
        );

        // Next tick still evaluates rules for the emptied zone-set, so a
        // later high-threshold breach can scale it back up.
        strategy.enforce_sla(&mut events).unwrap();
        let policies = policies.lock().unwrap();
        assert_eq!(policies.len(), 2);
        assert_eq!(policies[1].zones, zone_a);
    }

    #[test]
    fn equal_total_redistribution_arms_no_cooldown() {
        let zone_a = ZonesConfig::exact(["a"]);
        let zone_b = ZonesConfig::exact(["b"]);
        let mut allocated = CapacityRequirementsPerZones::new();
        allocated.set(zone_a.clone(), CapacityRequirements::machines(1));
        allocated.set(zone_b.clone(), CapacityRequirements::machines(2));

        let config = ScaleStrategyConfig {
            rules: vec![cpu_rule()],
            cooldown_after_scale_out_secs: 60,
            cooldown_after_scale_in_secs: 60,
            ..Default::default()
        };
        // Zone a grows, zone b shrinks; the total stays at 3 machines.
        let (mut strategy, policies) = recovered_harness(
            config,
            allocated,
            vec![
                Ok(AutoScalingOutcome::ThresholdBreached {
                    direction: ScaleDirection::Up,
                    new_capacity: CapacityRequirements::machines(2),
                    reason: "zone a busy".to_string(),
                }),
                Ok(AutoScalingOutcome::ThresholdBreached {
                    direction: ScaleDirection::Down,
                    new_capacity: CapacityRequirements::machines(1),
                    reason: "zone b idle".to_string(),
                }),
            ],
        );
        let mut events = ProgressEvents::new("pu-1", false, Arc::new(RecordingSink::new()));

        strategy.enforce_sla(&mut events).unwrap();
        assert_eq!(
            strategy
                .planned_capacity()
                .zones_capacity_or_zero(&zone_a),
            CapacityRequirements::machines(2)
        );

        // The redistribution armed no cooldown: the next tick runs a
        // full rule pass instead of reporting a cooldown pending.
        strategy.enforce_sla(&mut events).unwrap();
        assert_eq!(policies.lock().unwrap().len(), 4);
    }

    #[test]
    fn recover_state_adopts_the_allocated_capacity() {
        let mut allocated = CapacityRequirementsPerZones::new();
        allocated.set(ZonesConfig::AnyZones, CapacityRequirements::machines(4));

        let machines_policies = Arc::new(Mutex::new(vec![]));
        let mut strategy = AutomaticScaleStrategy::new(
            test_schema(),
            test_pool(),
            test_config(0),
            Box::new(ScriptedMachines {
                responses: VecDeque::new(),
                allocated: allocated.clone(),
                policies: machines_policies,
            }),
            Box::new(AlwaysOkContainers),
            Box::new(AlwaysOkRebalancing),
            Box::new(ScriptedAutoScaling {
                responses: VecDeque::new(),
                policies: Arc::new(Mutex::new(vec![])),
            }),
        );

        assert_eq!(strategy.recovered_state(), RecoveryState::NotRecovered);
        strategy.recover_state().unwrap();

        assert_eq!(strategy.recovered_state(), RecoveryState::Succeeded);
        assert_eq!(strategy.planned_capacity(), &allocated);
    }
}
