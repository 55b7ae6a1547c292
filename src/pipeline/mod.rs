//! End-to-end provisioning run: correlate, extract, synthesize, publish, deploy.

use std::path::PathBuf;
use tokio_util::sync::CancellationToken;

use crate::config::Config;
use crate::confirm::Confirm;
use crate::deploy::{self, Timings};
use crate::dnac::Controller;
use crate::error::{FusionError, FusionResult};
use crate::intent::Intent;
use crate::links;
use crate::models::{DeploymentTask, TemplateRecord};
use crate::render::BlockRenderer;
use crate::synth;
use crate::topology;

/// Per-run switches from the command line
#[derive(Debug, Clone, Default)]
pub struct RunOptions {
    pub strict: bool,
    /// Print the synthesized text without asking
    pub show_config: bool,
    /// Also write the synthesized text here
    pub output: Option<PathBuf>,
    /// Stop after synthesis
    pub dry_run: bool,
}

/// How a run ended. Every variant is a normal completion.
#[derive(Debug)]
pub enum Outcome {
    DryRun { config: String },
    /// Declined at a confirmation gate
    Aborted { at: &'static str },
    /// Configuration generated but unfit to publish
    NotPublished { reason: &'static str },
    /// Template published but nothing to deploy to
    Published { template: TemplateRecord },
    Deployed { template: TemplateRecord, task: DeploymentTask },
}

pub const VIEW_PROMPT: &str = "View generated configuration?";
pub const UPLOAD_PROMPT: &str = "Upload template to DNA Center?";
pub const DEPLOY_PROMPT: &str = "Proceed with deployment?";

/// Pipeline wires the collaborators of one run
pub struct Pipeline<'a> {
    pub controller: &'a dyn Controller,
    pub config: &'a Config,
    pub intent: &'a Intent,
    pub renderer: &'a BlockRenderer,
    pub gate: &'a dyn Confirm,
    pub timings: Timings,
    pub cancel: CancellationToken,
}

impl<'a> Pipeline<'a> {
    pub async fn run(&self, opts: &RunOptions) -> FusionResult<Outcome> {
        tracing::info!("Step 3: Collect Device Info");
        let inventory = topology::correlate(self.controller, self.intent, opts.strict).await?;

        tracing::info!("Step 4: Collect SDA Transit Config");
        let peers = links::extract(self.controller, &inventory, self.intent, opts.strict).await?;

        tracing::info!("Step 5: Generate Fusion Router config");
        let config = synth::synthesize(&peers, &self.intent.vrfs, self.renderer)?;
        let has_local_as = synth::local_as(&peers).is_some();

        tracing::info!("Step 6: Validate Generated Config");
        if let Some(path) = &opts.output {
            tokio::fs::write(path, &config).await.map_err(|e| {
                FusionError::Config(format!("cannot write {}: {}", path.display(), e))
            })?;
            tracing::info!("Configuration written to {}", path.display());
        }
        if opts.show_config || (!opts.dry_run && self.gate.confirm(VIEW_PROMPT).await?) {
            println!("{}", config);
        }
        if opts.dry_run {
            tracing::info!("Dry run, stopping before publish");
            return Ok(Outcome::DryRun { config });
        }

        if !has_local_as {
            let reason =
                "no border node reported an IP transit, so the BGP process has no local AS";
            tracing::warn!("Not publishing: {}", reason);
            return Ok(Outcome::NotPublished { reason });
        }

        tracing::info!("Step 7: Creating DNA Center Template");
        if !self.gate.confirm(UPLOAD_PROMPT).await? {
            tracing::info!("Quitting...");
            return Ok(Outcome::Aborted { at: UPLOAD_PROMPT });
        }
        let template = deploy::publish(
            self.controller,
            self.config,
            &config,
            inventory.device_types(),
            &self.timings,
            &self.cancel,
        )
        .await?;

        tracing::info!("Step 8: Deploy Fusion Router config");
        if !self.gate.confirm(DEPLOY_PROMPT).await? {
            tracing::info!("Quitting...");
            return Ok(Outcome::Aborted { at: DEPLOY_PROMPT });
        }
        let Some(target) = inventory.fusion() else {
            tracing::warn!("No fusion router in inventory; template published but not deployed");
            return Ok(Outcome::Published { template });
        };
        let task = deploy::deploy(
            self.controller,
            &template,
            target,
            self.timings.deployment,
            &self.cancel,
        )
        .await?;

        Ok(Outcome::Deployed { template, task })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::confirm::{AssumeYes, Scripted};
    use crate::deploy::PollPolicy;
    use crate::dnac::fake::FakeController;
    use crate::models::DeploymentStatus;
    use serde_json::json;
    use std::time::Duration;

    const INTENT: &str = r#"
border_nodes: [BN]
fusion_router: FUS
vrfs:
  RED:
    rd: "65001:10"
    vlans: [10]
    import: ["65001:10"]
"#;

    fn cfg() -> Config {
        Config::from_lookup(|key| match key {
            "DNAC_HOST" => Some("dnac".into()),
            "DNAC_USER" => Some("u".into()),
            "DNAC_PASSWORD" => Some("p".into()),
            "DNAC_PROJECT_NAME" => Some("Fusion".into()),
            _ => None,
        })
        .unwrap()
    }

    fn timings() -> Timings {
        let policy = PollPolicy {
            interval: Duration::from_millis(1),
            max_polls: 3,
        };
        Timings {
            settle: Duration::from_millis(1),
            task: policy,
            deployment: policy,
        }
    }

    fn fabric() -> FakeController {
        FakeController::new()
            .with_device("BN-1", "10.0.0.1", "Switches and Hubs", "C9300")
            .with_device("FUS-1", "10.0.0.9", "Routers", "ASR1000")
            .with_border(
                "10.0.0.1",
                json!({"payload": {
                    "name": "BN-1",
                    "deviceSettings": {
                        "internalDomainProtocolNumber": "65001",
                        "extConnectivitySettings": [{
                            "externalDomainProtocolNumber": "65100",
                            "l3Handoff": [
                                {"vlanId": "10", "localIpAddress": "172.16.1.1/30", "remoteIpAddress": "172.16.1.2/30"},
                                {"vlanId": 20, "localIpAddress": "172.16.2.1/30", "remoteIpAddress": "172.16.2.2/30"}
                            ]
                        }]
                    }
                }}),
            )
            .with_project("Fusion")
            .with_deploy_id("Template Deployemnt Id: 0f8fad5b-d9cb-469f-a165-70867728950e")
    }

    async fn run(
        fake: &FakeController,
        gate: &dyn Confirm,
        opts: RunOptions,
    ) -> FusionResult<Outcome> {
        let config = cfg();
        let intent = Intent::from_yaml_str(INTENT).unwrap();
        let renderer = BlockRenderer::builtin().unwrap();
        Pipeline {
            controller: fake,
            config: &config,
            intent: &intent,
            renderer: &renderer,
            gate,
            timings: timings(),
            cancel: CancellationToken::new(),
        }
        .run(&opts)
        .await
    }

    #[tokio::test]
    async fn test_full_run_deploys_to_fusion_router() {
        let fake = fabric().with_statuses(&["IN_PROGRESS", "SUCCESS"]);
        let outcome = run(&fake, &AssumeYes, RunOptions::default()).await.unwrap();

        let (template, task) = match outcome {
            Outcome::Deployed { template, task } => (template, task),
            other => panic!("expected a deployment, got {:?}", other),
        };
        assert_eq!(task.status, DeploymentStatus::Success);
        assert_eq!(task.deployment_id, "0f8fad5b-d9cb-469f-a165-70867728950e");

        let payload = &template.payload;
        assert!(payload.starts_with("vrf definition RED"));
        assert!(payload.contains("interface Vlan10\n vrf forwarding RED\n ip address 172.16.1.2 255.255.255.252"));
        assert!(payload.contains("interface Vlan20\n ip address 172.16.2.2"));
        assert!(payload.contains("router bgp 65100"));
        assert!(payload.contains("neighbor 172.16.1.1 remote-as 65001"));
        assert!(!payload.contains("neighbor 172.16.2.1"));

        let req = &fake.deploy_requests()[0];
        assert_eq!(req.target_info[0].id, "10.0.0.9");
        assert_eq!(fake.template_requests()[0].device_types.len(), 2);
    }

    #[tokio::test]
    async fn test_declined_upload_stops_before_controller_writes() {
        let fake = fabric();
        let gate = Scripted::new(&[false, false]);
        let outcome = run(&fake, &gate, RunOptions::default()).await.unwrap();

        assert!(matches!(outcome, Outcome::Aborted { at: UPLOAD_PROMPT }));
        assert_eq!(gate.asked(), vec![VIEW_PROMPT, UPLOAD_PROMPT]);
        assert_eq!(fake.count_calls("get_project"), 0);
        assert_eq!(fake.count_calls("deploy_template"), 0);
    }

    #[tokio::test]
    async fn test_declined_deploy_keeps_published_template() {
        let fake = fabric();
        let gate = Scripted::new(&[false, true, false]);
        let outcome = run(&fake, &gate, RunOptions::default()).await.unwrap();

        assert!(matches!(outcome, Outcome::Aborted { at: DEPLOY_PROMPT }));
        assert_eq!(fake.count_calls("version_template"), 1);
        assert_eq!(fake.count_calls("deploy_template"), 0);
    }

    #[tokio::test]
    async fn test_dry_run_writes_output_and_skips_gates() {
        let fake = fabric();
        let gate = Scripted::new(&[]);
        let path = std::env::temp_dir().join(format!("fusion-dry-run-{}.txt", std::process::id()));
        let opts = RunOptions {
            dry_run: true,
            output: Some(path.clone()),
            ..Default::default()
        };
        let outcome = run(&fake, &gate, opts).await.unwrap();

        let config = match outcome {
            Outcome::DryRun { config } => config,
            other => panic!("expected a dry run, got {:?}", other),
        };
        assert_eq!(std::fs::read_to_string(&path).unwrap(), config);
        assert!(gate.asked().is_empty());
        assert_eq!(fake.count_calls("get_project"), 0);
        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_no_fusion_router_publishes_only() {
        let fake = FakeController::new()
            .with_device("BN-1", "10.0.0.1", "Switches and Hubs", "C9300")
            .with_border(
                "10.0.0.1",
                json!({"name": "BN-1", "deviceSettings": {
                    "internalDomainProtocolNumber": 65001,
                    "extConnectivitySettings": [{"externalDomainProtocolNumber": 65100, "l3Handoff": []}]
                }}),
            )
            .with_project("Fusion");
        let outcome = run(&fake, &AssumeYes, RunOptions::default()).await.unwrap();

        assert!(matches!(outcome, Outcome::Published { .. }));
        assert_eq!(fake.count_calls("deploy_template"), 0);
    }

    #[tokio::test]
    async fn test_zero_borders_stops_before_publish() {
        let fake = FakeController::new()
            .with_device("FUS-1", "10.0.0.9", "Routers", "ASR1000")
            .with_project("Fusion");
        let gate = Scripted::new(&[false, true, true]);
        let outcome = run(&fake, &gate, RunOptions::default()).await.unwrap();

        assert!(matches!(outcome, Outcome::NotPublished { .. }));
        assert_eq!(gate.asked(), vec![VIEW_PROMPT]);
        assert_eq!(fake.count_calls("border_device_detail"), 0);
        assert_eq!(fake.count_calls("create_template"), 0);
        assert_eq!(fake.count_calls("deploy_template"), 0);
    }

    #[tokio::test]
    async fn test_controller_error_halts_run() {
        let fake = FakeController::new()
            .with_device("BN-1", "10.0.0.1", "Switches and Hubs", "C9300")
            .with_project("Fusion");
        let err = run(&fake, &AssumeYes, RunOptions::default()).await.unwrap_err();

        assert!(matches!(err, FusionError::Api { status: 404, .. }));
        assert_eq!(fake.count_calls("get_project"), 0);
    }

    #[tokio::test]
    async fn test_strict_mode_rejects_ambiguous_hostname() {
        let fake = FakeController::new().with_device("BN-FUS-1", "10.0.0.1", "Routers", "ASR1000");
        let opts = RunOptions {
            strict: true,
            ..Default::default()
        };
        let err = run(&fake, &AssumeYes, opts).await.unwrap_err();
        assert!(matches!(err, FusionError::Ambiguous { .. }));
    }
}
