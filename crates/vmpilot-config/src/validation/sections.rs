//! Per-section validators.

use crate::schema::{CreditBackend, PilotConfig};

use super::helpers::{validate_non_empty, validate_range, validate_range_f64};

pub(crate) fn validate_server(errors: &mut Vec<String>, config: &PilotConfig) {
    validate_non_empty(errors, "server.host", &config.server.host);
    validate_range(errors, "server.port", config.server.port, 1, 65535);
    validate_range(
        errors,
        "server.hello_timeout_secs",
        config.server.hello_timeout_secs,
        1,
        120,
    );
    validate_range(
        errors,
        "server.stats_interval_secs",
        config.server.stats_interval_secs,
        5,
        3600,
    );
}

pub(crate) fn validate_agent(errors: &mut Vec<String>, config: &PilotConfig) {
    let agent = &config.agent;
    validate_non_empty(errors, "agent.default_model", &agent.default_model);
    validate_range(errors, "agent.max_tokens", agent.max_tokens, 256, 64000);
    validate_range(
        errors,
        "agent.thinking_budget",
        agent.thinking_budget,
        1024,
        32000,
    );
    validate_range(errors, "agent.max_tool_rounds", agent.max_tool_rounds, 1, 500);
    validate_range(
        errors,
        "agent.max_history_messages",
        agent.max_history_messages,
        2,
        10000,
    );
    validate_range(errors, "agent.images_to_keep", agent.images_to_keep, 0, 50);
    validate_range(
        errors,
        "agent.image_removal_chunk",
        agent.image_removal_chunk,
        1,
        50,
    );

    // The thinking budget has to fit inside the response budget.
    if agent.thinking_budget >= agent.max_tokens {
        errors.push(format!(
            "agent.thinking_budget = {} must be smaller than agent.max_tokens = {}",
            agent.thinking_budget, agent.max_tokens
        ));
    }
}

pub(crate) fn validate_sampling(errors: &mut Vec<String>, config: &PilotConfig) {
    let sampling = &config.sampling;
    validate_range(errors, "sampling.max_attempts", sampling.max_attempts, 1, 10);
    validate_range(
        errors,
        "sampling.initial_backoff_ms",
        sampling.initial_backoff_ms,
        10,
        60_000,
    );
    validate_range(
        errors,
        "sampling.max_backoff_ms",
        sampling.max_backoff_ms,
        10,
        300_000,
    );
    validate_range(
        errors,
        "sampling.request_timeout_secs",
        sampling.request_timeout_secs,
        5,
        600,
    );
    if sampling.initial_backoff_ms > sampling.max_backoff_ms {
        errors.push(format!(
            "sampling.initial_backoff_ms = {} exceeds sampling.max_backoff_ms = {}",
            sampling.initial_backoff_ms, sampling.max_backoff_ms
        ));
    }
}

pub(crate) fn validate_instance(errors: &mut Vec<String>, config: &PilotConfig) {
    let instance = &config.instance;
    validate_non_empty(errors, "instance.api_url", &instance.api_url);
    validate_non_empty(errors, "instance.instance_type", &instance.instance_type);
    validate_range(
        errors,
        "instance.provision_timeout_secs",
        instance.provision_timeout_secs,
        5,
        900,
    );
    validate_range(
        errors,
        "instance.tool_timeout_secs",
        instance.tool_timeout_secs,
        1,
        900,
    );
    validate_range(
        errors,
        "instance.release_timeout_secs",
        instance.release_timeout_secs,
        1,
        300,
    );
    validate_range(errors, "instance.display_width", instance.display_width, 320, 7680);
    validate_range(
        errors,
        "instance.display_height",
        instance.display_height,
        240,
        4320,
    );
}

pub(crate) fn validate_session(errors: &mut Vec<String>, config: &PilotConfig) {
    validate_range(
        errors,
        "session.idle_timeout_secs",
        config.session.idle_timeout_secs,
        10,
        86_400,
    );
}

pub(crate) fn validate_credits(errors: &mut Vec<String>, config: &PilotConfig) {
    let credits = &config.credits;
    if credits.backend == CreditBackend::Disabled {
        return;
    }
    validate_range_f64(
        errors,
        "credits.cost_per_turn",
        credits.cost_per_turn,
        0.0,
        1_000_000.0,
    );
    for (key, balance) in &credits.accounts {
        if *balance < 0.0 {
            errors.push(format!("credits.accounts.{key} = {balance} is negative"));
        }
    }
}
