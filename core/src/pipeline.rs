//! The audit **orchestrator**.
//!
//! Fetches the router's ARP table once, then runs every switch's
//! MAC table → ARP join → reverse DNS pipeline as its own task. Device sessions are
//! bounded by one semaphore, reverse lookups by the limiter inside [`NameResolution`].
//! A switch lands in the report only when its whole pipeline has finished.

use std::collections::HashMap;
use std::sync::Arc;

use edgemap_common::{
    config::AuditPlan,
    debug,
    error::DeviceError,
    info,
    network::device::{Credentials, DeviceEndpoint},
    network::vlan::UserVlans,
    records::{ArpTable, PortIdentityRecord, SwitchReport},
    success, warn,
};
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info_span, Instrument};

use crate::correlate::{dns_query, ip_table, NameResolution};
use crate::fetch::{fetch_arp_table, fetch_mac_table};
use crate::session::Connector;

/// What a failing switch does to the rest of the run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Record the switch under [`SwitchReport::failures`] and finish the others.
    #[default]
    Continue,
    /// Cancel the remaining switches and fail the run.
    Abort,
}

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("cannot read the ARP table of router {router}")]
    Arp {
        router: String,
        #[source]
        source: DeviceError,
    },

    #[error("switch {switch} failed")]
    Switch {
        switch: String,
        #[source]
        source: DeviceError,
    },

    #[error("switch {switch} task did not complete: {reason}")]
    Task { switch: String, reason: String },
}

pub struct AuditPipeline {
    connector: Arc<dyn Connector>,
    names: NameResolution,
    sessions: Arc<Semaphore>,
    policy: FailurePolicy,
    on_switch_done: Option<Box<dyn Fn(usize, usize) + Send + Sync>>,
}

impl AuditPipeline {
    pub fn new(connector: Arc<dyn Connector>, names: NameResolution, max_sessions: usize) -> Self {
        Self {
            connector,
            names,
            sessions: Arc::new(Semaphore::new(max_sessions.max(1))),
            policy: FailurePolicy::default(),
            on_switch_done: None,
        }
    }

    pub fn with_policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Called with `(finished, total)` each time a switch succeeds or fails.
    pub fn on_switch_done(mut self, callback: Box<dyn Fn(usize, usize) + Send + Sync>) -> Self {
        self.on_switch_done = Some(callback);
        self
    }

    pub async fn run(&self, plan: &AuditPlan, credentials: Arc<Credentials>) -> Result<SwitchReport, PipelineError> {
        let endpoint = |address: &str| {
            DeviceEndpoint::new(address, Arc::clone(&credentials)).with_port(plan.tuning.ssh_port)
        };

        let router = endpoint(&plan.router);
        let arp = {
            let _permit = self.sessions.acquire().await.ok();
            fetch_arp_table(self.connector.as_ref(), &router)
                .instrument(info_span!("arp", router = %plan.router))
                .await
                .map_err(|source| PipelineError::Arp {
                    router: plan.router.clone(),
                    source,
                })?
        };
        info!(router = %plan.router, entries = arp.len(), "ARP table loaded");

        let arp = Arc::new(arp);
        let vlans = Arc::new(plan.vlans.clone());
        let mut tasks = JoinSet::new();
        let mut switch_of = HashMap::new();

        for switch in &plan.switches {
            let switch_ep = endpoint(switch);
            let connector = Arc::clone(&self.connector);
            let sessions = Arc::clone(&self.sessions);
            let names = self.names.clone();
            let arp = Arc::clone(&arp);
            let vlans = Arc::clone(&vlans);

            let task = async move {
                audit_switch(connector.as_ref(), &switch_ep, &vlans, &arp, &names, &sessions).await
            };
            let handle = tasks.spawn(task.instrument(info_span!("switch", switch = %switch)));
            switch_of.insert(handle.id(), switch.clone());
        }

        let total = plan.switches.len();
        let mut finished = 0;
        let mut report = SwitchReport::default();

        while let Some(joined) = tasks.join_next_with_id().await {
            let (switch, outcome) = match joined {
                Ok((id, result)) => {
                    let switch = switch_of.remove(&id).unwrap_or_default();
                    let outcome = result.map_err(|source| PipelineError::Switch {
                        switch: switch.clone(),
                        source,
                    });
                    (switch, outcome)
                }
                Err(e) => {
                    let switch = switch_of.remove(&e.id()).unwrap_or_default();
                    let outcome = Err(PipelineError::Task {
                        switch: switch.clone(),
                        reason: e.to_string(),
                    });
                    (switch, outcome)
                }
            };

            finished += 1;
            if let Some(callback) = &self.on_switch_done {
                callback(finished, total);
            }

            match outcome {
                Ok(records) => {
                    success!(switch = %switch, records = records.len(), "switch audited");
                    report.entries.insert(switch, records);
                }
                Err(e) if self.policy == FailurePolicy::Abort => {
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    let reason = error_chain(&e);
                    warn!(switch = %switch, "{reason}");
                    report.failures.insert(switch, reason);
                }
            }
        }

        Ok(report)
    }
}

/// One switch's pipeline. The session permit is held only while the switch is queried.
async fn audit_switch(
    connector: &dyn Connector,
    switch: &DeviceEndpoint,
    vlans: &UserVlans,
    arp: &ArpTable,
    names: &NameResolution,
    sessions: &Semaphore,
) -> Result<Vec<PortIdentityRecord>, DeviceError> {
    let port_macs = {
        let _permit = sessions.acquire().await.ok();
        fetch_mac_table(connector, switch, vlans).await?
    };

    let joined = ip_table(&port_macs, arp);
    debug!(
        macs = port_macs.len(),
        joined = joined.len(),
        "joined mac table with arp table"
    );

    Ok(dns_query(joined, names).await)
}

fn error_chain(e: &dyn std::error::Error) -> String {
    let mut text = e.to_string();
    let mut source = e.source();
    while let Some(cause) = source {
        text.push_str(": ");
        text.push_str(&cause.to_string());
        source = cause.source();
    }
    text
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use edgemap_common::config::ConfigFile;
    use edgemap_protocols::cli::ios;

    use super::*;
    use crate::resolver::StaticResolver;
    use crate::session::scripted::{ScriptedConnector, ScriptedDevice};

    const CONFIG: &str = "
router: [10.0.0.1]
switch_list: [10.0.1.11, 10.0.1.12]
user_vlan: [10]
dns_server_list: [127.0.0.1]
";

    const ARP: &str = "\
Protocol  Address          Age (min)  Hardware Addr   Type   Interface
Internet  10.0.10.5              12   aabb.cc00.0001  ARPA   Vlan10
";

    const STATUS: &str = "\
Port      Name               Status       Vlan       Duplex  Speed Type
Gi1/0/1                      connected    10         a-full a-1000 10/100/1000BaseTX
";

    const MACS: &str = "\
Vlan    Mac Address       Type        Ports
----    -----------       --------    -----
  10    aabb.cc00.0001    DYNAMIC     Gi1/0/1
";

    fn switch() -> ScriptedDevice {
        ScriptedDevice::new()
            .respond(ios::SHOW_INTERFACES_STATUS, STATUS)
            .respond(ios::show_mac_address_table_vlan("10"), MACS)
    }

    fn plan() -> AuditPlan {
        ConfigFile::from_yaml(CONFIG).unwrap().audit_plan().unwrap()
    }

    fn pipeline(connector: &ScriptedConnector) -> AuditPipeline {
        let names = NameResolution::new(Arc::new(StaticResolver::new()), 4, 0);
        AuditPipeline::new(Arc::new(connector.clone()), names, 2)
    }

    fn creds() -> Arc<Credentials> {
        Arc::new(Credentials::new("u", "p"))
    }

    #[tokio::test]
    async fn continue_policy_reports_failed_switch() {
        let connector = ScriptedConnector::new()
            .with_device("10.0.0.1", ScriptedDevice::new().respond(ios::SHOW_IP_ARP, ARP))
            .with_device("10.0.1.11", switch());

        let report = pipeline(&connector).run(&plan(), creds()).await.unwrap();

        assert_eq!(report.entries.keys().collect::<Vec<_>>(), vec!["10.0.1.11"]);
        assert_eq!(report.entries["10.0.1.11"].len(), 1);
        assert!(report.failures["10.0.1.12"].contains("cannot connect"));
        assert_eq!(connector.open_sessions(), 0);
    }

    #[tokio::test]
    async fn abort_policy_fails_the_run() {
        let connector = ScriptedConnector::new()
            .with_device("10.0.0.1", ScriptedDevice::new().respond(ios::SHOW_IP_ARP, ARP))
            .with_device("10.0.1.11", switch());

        let err = pipeline(&connector)
            .with_policy(FailurePolicy::Abort)
            .run(&plan(), creds())
            .await
            .unwrap_err();

        assert!(matches!(err, PipelineError::Switch { ref switch, .. } if switch == "10.0.1.12"));
    }

    #[tokio::test]
    async fn empty_arp_table_still_reports_every_switch() {
        let connector = ScriptedConnector::new()
            .with_device(
                "10.0.0.1",
                ScriptedDevice::new().respond(ios::SHOW_IP_ARP, ARP.lines().next().unwrap_or_default()),
            )
            .with_device("10.0.1.11", switch())
            .with_device("10.0.1.12", switch());

        let report = pipeline(&connector).run(&plan(), creds()).await.unwrap();

        assert!(report.failures.is_empty());
        assert_eq!(report.entries.len(), 2);
        assert!(report.entries.values().all(Vec::is_empty));
        assert_eq!(report.record_count(), 0);
    }

    #[tokio::test]
    async fn arp_failure_is_fatal_under_continue() {
        let connector = ScriptedConnector::new()
            .with_device("10.0.1.11", switch())
            .with_device("10.0.1.12", switch());

        let err = pipeline(&connector).run(&plan(), creds()).await.unwrap_err();

        assert!(matches!(err, PipelineError::Arp { .. }));
        assert_eq!(connector.sessions_opened(), 0);
    }

    #[tokio::test]
    async fn progress_is_reported_per_switch() {
        let connector = ScriptedConnector::new()
            .with_device("10.0.0.1", ScriptedDevice::new().respond(ios::SHOW_IP_ARP, ARP))
            .with_device("10.0.1.11", switch())
            .with_device("10.0.1.12", switch());
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&seen);

        let report = pipeline(&connector)
            .on_switch_done(Box::new(move |done, total| {
                assert_eq!(total, 2);
                counter.store(done, Ordering::SeqCst);
            }))
            .run(&plan(), creds())
            .await
            .unwrap();

        assert_eq!(seen.load(Ordering::SeqCst), 2);
        assert!(report.failures.is_empty());
        assert_eq!(report.record_count(), 2);
    }
}
