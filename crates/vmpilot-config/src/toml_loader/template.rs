//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# vmpilot configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.
# Secrets come from the environment: ANTHROPIC_API_KEY, SUPABASE_URL, SUPABASE_KEY.

[server]
# host = "0.0.0.0"
# port = 8000                 # 1-65535, VMPILOT_PORT overrides
# hello_timeout_secs = 10     # 1-120
# stats_interval_secs = 60    # 5-3600

[agent]
# default_model = "claude-3-7-sonnet-20250219"
# max_tokens = 4096           # 256-64000
# thinking_budget = 1024      # 1024-32000, only for -thinking models
# max_tool_rounds = 50        # 1-500
# max_history_messages = 200  # 2-10000
# images_to_keep = 3          # 0-50
# image_removal_chunk = 3     # 1-50
# parallel_tool_calls = false
# system_prompt = "..."

[sampling]
# max_attempts = 3            # 1-10
# initial_backoff_ms = 500    # 10-60000
# max_backoff_ms = 8000       # 10-300000
# request_timeout_secs = 120  # 5-600

[instance]
# api_url = "https://api.scrapybara.com"
# instance_type = "ubuntu"
# provision_timeout_secs = 120  # 5-900
# tool_timeout_secs = 60        # 1-900
# release_timeout_secs = 30     # 1-300
# display_width = 1024
# display_height = 768

[session]
# idle_timeout_secs = 600     # 10-86400

[credits]
# backend = "disabled"        # disabled, memory, supabase
# policy = "admission"        # admission, per_turn
# cost_per_turn = 1.0

# [credits.accounts]          # memory backend only
# "api-key" = 10.0

[logging]
# level = "info"              # RUST_LOG and --log-level take precedence
"##
    .to_string()
}
