use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use clap::{Parser, Subcommand};

use tether::{
    AgentRole, ExecutionMode, Orchestrator, Priority, TaskSpec, TetherConfig, tlog, Result,
};

/// Tether - calibrated autonomy for automated task resolution
#[derive(Parser, Debug)]
#[command(name = "tether")]
#[command(version, about, long_about = None)]
#[command(after_help = "ENVIRONMENT:\n    TETHER_DEBUG=1    Enable debug logging (alternative to --debug)")]
pub struct Cli {
    /// Path to a config file (default: ~/.tether/tether.toml)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Enable debug logging (writes to ~/.tether/tether.log)
    #[arg(short = 'd', long)]
    pub debug: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Submit a task for resolution
    Submit {
        /// Task title
        #[arg(short = 't', long)]
        title: String,

        /// Detailed task description
        #[arg(short = 'D', long, default_value = "")]
        description: String,

        /// Task priority: low, medium, high, critical
        #[arg(short = 'p', long, default_value = "medium")]
        priority: String,

        /// Execution mode override: single_agent, micro_swarm,
        /// full_swarm, human_led (default: let the scorer decide)
        #[arg(short = 'm', long, default_value = "auto")]
        mode: String,

        /// Wait for completion and print the result
        #[arg(long)]
        wait: bool,

        /// Timeout in seconds (with --wait)
        #[arg(long, default_value_t = 300)]
        timeout: u64,

        /// Print the task's audit trail after completion (with --wait)
        #[arg(long)]
        audit: bool,
    },

    /// List available agent roles
    Agents,

    /// Show information about an execution mode
    Mode {
        /// Mode name, e.g. single_agent
        name: String,
    },

    /// Validate the effective configuration
    Validate,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    tether::log::init_with_debug(cli.debug);

    let config = match &cli.config {
        Some(path) => TetherConfig::from_path(path)?,
        None => TetherConfig::load()?,
    };

    match cli.command {
        Command::Submit {
            title,
            description,
            priority,
            mode,
            wait,
            timeout,
            audit,
        } => run_submit(config, title, description, priority, mode, wait, timeout, audit),
        Command::Agents => run_agents(),
        Command::Mode { name } => run_mode_info(&name),
        Command::Validate => run_validate(&config),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_submit(
    config: TetherConfig,
    title: String,
    description: String,
    priority: String,
    mode: String,
    wait: bool,
    timeout: u64,
    audit: bool,
) -> Result<()> {
    let priority = Priority::from_str(&priority)?;
    // Reject bad mode strings here instead of failing the task later.
    let mode = ExecutionMode::from_str(&mode)?;

    let mut spec = TaskSpec::new(title)
        .description(description)
        .task_type("cli_task")
        .priority(priority);
    if mode != ExecutionMode::Auto {
        spec = spec.mode(&mode.to_string());
    }

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async {
        let orchestrator = Orchestrator::new(config)?;
        let task = orchestrator.submit(spec).await;
        println!("Task submitted: {}", task.id);
        tlog!("cli submit id={} wait={}", task.id.short(), wait);

        if !wait {
            return Ok(());
        }

        println!("Waiting for completion...");
        let result = orchestrator
            .await_result(task.id, Some(Duration::from_secs(timeout)))
            .await?;

        println!();
        println!("Result:");
        println!("  Status:     {}", result.status);
        println!("  Mode:       {}", result.mode);
        println!("  Confidence: {}%", result.confidence);
        println!("  Summary:    {}", result.summary);
        if !result.resolution_steps.is_empty() {
            println!("  Steps:");
            for step in &result.resolution_steps {
                println!("    - {}", step);
            }
        }
        println!("  Time:       {}ms", result.execution_time_ms);
        println!("  Cost:       ${:.4}", result.cost_usd);

        if audit {
            println!();
            println!("Audit trail:");
            for entry in orchestrator.audit_log(Some(&task.id)) {
                println!(
                    "  [{}] {}",
                    entry.timestamp.format("%H:%M:%S%.3f"),
                    entry.event
                );
            }
        }
        Ok(())
    })
}

fn run_agents() -> Result<()> {
    println!("Available agent roles:");
    for role in AgentRole::ALL {
        println!("  - {}", role);
    }
    Ok(())
}

fn run_mode_info(name: &str) -> Result<()> {
    let mode = ExecutionMode::from_str(name)?;
    let (agents, oversight, use_cases) = match mode {
        ExecutionMode::SingleAgent => (
            "1",
            "Minimal",
            "Password resets, status queries, simple lookups",
        ),
        ExecutionMode::MicroSwarm => (
            "2-3",
            "Checkpoint-based",
            "Multi-system diagnostics, coordinated updates",
        ),
        ExecutionMode::FullSwarm => (
            "4+",
            "Active monitoring",
            "Disaster recovery, complex migrations",
        ),
        ExecutionMode::HumanLed => (
            "Variable",
            "Direct control",
            "Security incidents, compliance matters",
        ),
        ExecutionMode::Auto => (
            "Decided per task",
            "Decided per task",
            "Let the complexity scorer choose",
        ),
    };

    println!();
    println!("Mode: {}", mode);
    println!("----------------------------------------");
    println!("  Agents:    {}", agents);
    println!("  Oversight: {}", oversight);
    println!("  Use cases: {}", use_cases);
    Ok(())
}

fn run_validate(config: &TetherConfig) -> Result<()> {
    println!("Validating tether configuration...");
    // Already validated at load; echo the effective values.
    config.validate()?;

    println!("  Confidence thresholds:");
    println!("    Auto-execute:     {}%", config.thresholds.auto_execute);
    println!("    Execute+review:   {}%", config.thresholds.execute_review);
    println!("    Require approval: {}%", config.thresholds.require_approval);
    println!("  Approval timeout:   {}s", config.approval_timeout_secs);
    println!("  Action timeout:     {}s", config.action_timeout_secs);
    println!("  Rate cap:           {}/min", config.max_actions_per_minute);
    println!("  Tool-call cap:      {}/task", config.max_tool_calls_per_task);
    println!("  Audit all actions:  {}", config.audit_all_actions);
    println!("  Log tool outputs:   {}", config.log_tool_outputs);
    println!();
    println!("Configuration valid.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_submit_command_basic() {
        let cli = Cli::try_parse_from(["tether", "submit", "--title", "Fix login"]).unwrap();
        match cli.command {
            Command::Submit {
                title,
                priority,
                mode,
                wait,
                ..
            } => {
                assert_eq!(title, "Fix login");
                assert_eq!(priority, "medium");
                assert_eq!(mode, "auto");
                assert!(!wait);
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_submit_command_all_flags() {
        let cli = Cli::try_parse_from([
            "tether", "submit", "-t", "Outage", "-D", "api down", "-p", "critical", "-m",
            "full_swarm", "--wait", "--timeout", "60", "--audit",
        ])
        .unwrap();
        match cli.command {
            Command::Submit {
                title,
                description,
                priority,
                mode,
                wait,
                timeout,
                audit,
            } => {
                assert_eq!(title, "Outage");
                assert_eq!(description, "api down");
                assert_eq!(priority, "critical");
                assert_eq!(mode, "full_swarm");
                assert!(wait);
                assert_eq!(timeout, 60);
                assert!(audit);
            }
            _ => panic!("Expected Submit command"),
        }
    }

    #[test]
    fn test_submit_requires_title() {
        assert!(Cli::try_parse_from(["tether", "submit"]).is_err());
    }

    #[test]
    fn test_agents_command() {
        let cli = Cli::try_parse_from(["tether", "agents"]).unwrap();
        assert_eq!(cli.command, Command::Agents);
    }

    #[test]
    fn test_mode_command() {
        let cli = Cli::try_parse_from(["tether", "mode", "micro_swarm"]).unwrap();
        match cli.command {
            Command::Mode { name } => assert_eq!(name, "micro_swarm"),
            _ => panic!("Expected Mode command"),
        }
    }

    #[test]
    fn test_validate_command_with_config_path() {
        let cli = Cli::try_parse_from(["tether", "-c", "/tmp/t.toml", "validate"]).unwrap();
        assert_eq!(cli.command, Command::Validate);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/t.toml")));
    }

    #[test]
    fn test_debug_flag() {
        let cli = Cli::try_parse_from(["tether", "-d", "agents"]).unwrap();
        assert!(cli.debug);
    }

    #[test]
    fn test_unknown_command_fails() {
        assert!(Cli::try_parse_from(["tether", "unknown"]).is_err());
    }

    #[test]
    fn test_mode_info_rejects_unknown_mode() {
        assert!(run_mode_info("mega_swarm").is_err());
    }

    #[test]
    fn test_help_lists_commands() {
        use clap::CommandFactory;
        let help = Cli::command().render_help().to_string();
        assert!(help.contains("submit"));
        assert!(help.contains("agents"));
        assert!(help.contains("mode"));
        assert!(help.contains("validate"));
    }
}
