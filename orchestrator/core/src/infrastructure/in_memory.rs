// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

//! In-Memory Cloud
//!
//! Lightweight stand-in for the cluster and load balancer APIs, used by the
//! test suite and for local dry runs. Mirrors the provider behaviour the
//! orchestrator depends on:
//!
//! - task definition revisions are append-only and numbered per family
//! - only active services are described; deleted ones disappear
//! - every listener carries an implicit default rule
//! - creating a rule on an occupied priority, or a duplicate target group,
//!   fails with `CloudError::Conflict`
//!
//! Individual operations can be made to fail, and call counts are recorded,
//! so tests can assert on what was (and was not) issued.

use crate::domain::cloud::{CloudError, ContainerCluster, LoadBalancer};
use crate::domain::compute::{ComputeDefinition, DefinitionArn};
use crate::domain::routing::{
    ListenerRule, RoutingTarget, RuleArn, RulePriority, TargetGroupArn, TargetGroupSpec,
};
use crate::domain::service::{ServiceInstance, ServiceSpec};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    RegisterTaskDefinition,
    DescribeService,
    CreateService,
    UpdateService,
    SetDesiredCount,
    DeleteService,
    FindTargetGroup,
    CreateTargetGroup,
    ListRules,
    CreateRule,
    SetRuleTarget,
    DeleteRule,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RegisteredDefinition {
    pub arn: DefinitionArn,
    pub revision: u32,
    pub definition: ComputeDefinition,
}

#[derive(Debug, Default)]
struct CloudState {
    definitions: Vec<RegisteredDefinition>,
    services: BTreeMap<(String, String), ServiceInstance>,
    target_groups: BTreeMap<String, RoutingTarget>,
    listeners: HashMap<String, Vec<ListenerRule>>,
    next_rule_id: u64,
    calls: HashMap<Operation, usize>,
    failing: HashMap<Operation, CloudError>,
}

impl CloudState {
    fn enter(&mut self, op: Operation) -> Result<(), CloudError> {
        *self.calls.entry(op).or_default() += 1;
        match self.failing.get(&op) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }

    fn listener(&mut self, listener_arn: &str) -> &mut Vec<ListenerRule> {
        self.listeners
            .entry(listener_arn.to_string())
            .or_insert_with(|| {
                vec![ListenerRule {
                    arn: RuleArn::new(format!("{listener_arn}/rule/default")),
                    priority: RulePriority::Default,
                    path_patterns: vec![],
                    target_arns: vec![],
                }]
            })
    }

    fn find_rule_mut(&mut self, rule: &RuleArn) -> Option<&mut ListenerRule> {
        self.listeners
            .values_mut()
            .flat_map(|rules| rules.iter_mut())
            .find(|r| &r.arn == rule)
    }
}

#[derive(Debug, Default)]
pub struct InMemoryCloud {
    state: Mutex<CloudState>,
}

impl InMemoryCloud {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent call to `op` fail with `error`.
    pub fn fail_on(&self, op: Operation, error: CloudError) {
        self.state.lock().failing.insert(op, error);
    }

    pub fn clear_failures(&self) {
        self.state.lock().failing.clear();
    }

    pub fn call_count(&self, op: Operation) -> usize {
        self.state.lock().calls.get(&op).copied().unwrap_or(0)
    }

    /// Seed a rule owned by someone else on the shared listener.
    pub fn insert_rule(&self, listener_arn: &str, priority: u32, path_pattern: &str, target: &TargetGroupArn) -> RuleArn {
        let mut state = self.state.lock();
        state.next_rule_id += 1;
        let arn = RuleArn::new(format!("{listener_arn}/rule/{}", state.next_rule_id));
        state.listener(listener_arn).push(ListenerRule {
            arn: arn.clone(),
            priority: RulePriority::Numbered(priority),
            path_patterns: vec![path_pattern.to_string()],
            target_arns: vec![target.clone()],
        });
        arn
    }

    pub fn rules(&self, listener_arn: &str) -> Vec<ListenerRule> {
        self.state.lock().listener(listener_arn).clone()
    }

    pub fn services(&self) -> Vec<ServiceInstance> {
        self.state.lock().services.values().cloned().collect()
    }

    pub fn definitions(&self, family: &str) -> Vec<RegisteredDefinition> {
        self.state
            .lock()
            .definitions
            .iter()
            .filter(|d| d.definition.family == family)
            .cloned()
            .collect()
    }

    pub fn definition(&self, arn: &DefinitionArn) -> Option<ComputeDefinition> {
        self.state
            .lock()
            .definitions
            .iter()
            .find(|d| &d.arn == arn)
            .map(|d| d.definition.clone())
    }

    pub fn target_groups(&self) -> Vec<RoutingTarget> {
        self.state.lock().target_groups.values().cloned().collect()
    }
}

#[async_trait]
impl ContainerCluster for InMemoryCloud {
    async fn register_task_definition(&self, definition: &ComputeDefinition) -> Result<DefinitionArn, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::RegisterTaskDefinition)?;

        let revision = state
            .definitions
            .iter()
            .filter(|d| d.definition.family == definition.family)
            .count() as u32
            + 1;
        let arn = DefinitionArn::new(format!(
            "arn:aws:ecs:local:000000000000:task-definition/{}:{}",
            definition.family, revision
        ));
        state.definitions.push(RegisteredDefinition {
            arn: arn.clone(),
            revision,
            definition: definition.clone(),
        });
        Ok(arn)
    }

    async fn describe_service(&self, cluster: &str, name: &str) -> Result<Option<ServiceInstance>, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::DescribeService)?;
        Ok(state.services.get(&(cluster.to_string(), name.to_string())).cloned())
    }

    async fn create_service(&self, spec: &ServiceSpec) -> Result<ServiceInstance, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::CreateService)?;

        let key = (spec.cluster.clone(), spec.name.clone());
        if state.services.contains_key(&key) {
            return Err(CloudError::Conflict(format!(
                "Creation of service {} was not idempotent",
                spec.name
            )));
        }
        let service = ServiceInstance {
            name: spec.name.clone(),
            definition_arn: spec.definition_arn.clone(),
            desired_count: spec.desired_count,
            target_group_arn: Some(spec.target_group_arn.clone()),
        };
        state.services.insert(key, service.clone());
        Ok(service)
    }

    async fn update_service(&self, spec: &ServiceSpec) -> Result<ServiceInstance, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::UpdateService)?;

        let service = state
            .services
            .get_mut(&(spec.cluster.clone(), spec.name.clone()))
            .ok_or_else(|| CloudError::NotFound(format!("service {}", spec.name)))?;
        service.definition_arn = spec.definition_arn.clone();
        service.desired_count = spec.desired_count;
        service.target_group_arn = Some(spec.target_group_arn.clone());
        Ok(service.clone())
    }

    async fn set_desired_count(&self, cluster: &str, name: &str, count: u32) -> Result<(), CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::SetDesiredCount)?;

        let service = state
            .services
            .get_mut(&(cluster.to_string(), name.to_string()))
            .ok_or_else(|| CloudError::NotFound(format!("service {name}")))?;
        service.desired_count = count;
        Ok(())
    }

    async fn delete_service(&self, cluster: &str, name: &str) -> Result<(), CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::DeleteService)?;

        state
            .services
            .remove(&(cluster.to_string(), name.to_string()))
            .map(|_| ())
            .ok_or_else(|| CloudError::NotFound(format!("service {name}")))
    }
}

#[async_trait]
impl LoadBalancer for InMemoryCloud {
    async fn find_target_group(&self, name: &str) -> Result<Option<RoutingTarget>, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::FindTargetGroup)?;
        Ok(state.target_groups.get(name).cloned())
    }

    async fn create_target_group(&self, spec: &TargetGroupSpec) -> Result<RoutingTarget, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::CreateTargetGroup)?;

        if state.target_groups.contains_key(&spec.name) {
            return Err(CloudError::Conflict(format!(
                "A target group with the same name '{}' exists",
                spec.name
            )));
        }
        let target = RoutingTarget {
            arn: TargetGroupArn::new(format!(
                "arn:aws:elasticloadbalancing:local:000000000000:targetgroup/{}/{:04}",
                spec.name,
                state.target_groups.len() + 1
            )),
            name: spec.name.clone(),
            protocol: "HTTP".to_string(),
            port: spec.port,
            health_check_path: spec.health_check_path.clone(),
        };
        state.target_groups.insert(spec.name.clone(), target.clone());
        Ok(target)
    }

    async fn list_rules(&self, listener_arn: &str) -> Result<Vec<ListenerRule>, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::ListRules)?;
        Ok(state.listener(listener_arn).clone())
    }

    async fn create_rule(
        &self,
        listener_arn: &str,
        priority: u32,
        path_pattern: &str,
        target: &TargetGroupArn,
    ) -> Result<ListenerRule, CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::CreateRule)?;

        let taken: HashSet<u32> = state
            .listener(listener_arn)
            .iter()
            .filter_map(|r| r.priority.number())
            .collect();
        if taken.contains(&priority) {
            return Err(CloudError::Conflict(format!("Priority '{priority}' is currently in use")));
        }

        state.next_rule_id += 1;
        let rule = ListenerRule {
            arn: RuleArn::new(format!("{listener_arn}/rule/{}", state.next_rule_id)),
            priority: RulePriority::Numbered(priority),
            path_patterns: vec![path_pattern.to_string()],
            target_arns: vec![target.clone()],
        };
        state.listener(listener_arn).push(rule.clone());
        Ok(rule)
    }

    async fn set_rule_target(&self, rule: &RuleArn, target: &TargetGroupArn) -> Result<(), CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::SetRuleTarget)?;

        let existing = state
            .find_rule_mut(rule)
            .ok_or_else(|| CloudError::NotFound(format!("rule {}", rule.as_str())))?;
        existing.target_arns = vec![target.clone()];
        Ok(())
    }

    async fn delete_rule(&self, rule: &RuleArn) -> Result<(), CloudError> {
        let mut state = self.state.lock();
        state.enter(Operation::DeleteRule)?;

        for rules in state.listeners.values_mut() {
            if let Some(index) = rules.iter().position(|r| &r.arn == rule) {
                rules.remove(index);
                return Ok(());
            }
        }
        Err(CloudError::NotFound(format!("rule {}", rule.as_str())))
    }
}
