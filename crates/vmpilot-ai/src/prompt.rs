//! System prompt for computer-use sessions.

use chrono::NaiveDate;

use crate::DisplaySize;

/// Default system prompt, stamped with the current date.
pub fn default_system_prompt(display: DisplaySize) -> String {
    system_prompt_for(chrono::Local::now().date_naive(), display)
}

/// The prompt for a fixed date, so it can be checked in tests.
pub fn system_prompt_for(today: NaiveDate, display: DisplaySize) -> String {
    format!(
        "<SYSTEM_CAPABILITY>\n\
         * You are operating an Ubuntu virtual machine with internet access through the computer, bash and str_replace_editor tools.\n\
         * The screen is {width}x{height}. Take a screenshot before acting on the screen and after any action whose result you need to see.\n\
         * GUI applications may take a moment to appear. Prefer the bash tool for file and process work, and the browser for anything on the web.\n\
         * When output is long, redirect it to a file and inspect it with str_replace_editor or grep instead of printing it in full.\n\
         * Chain several actions into one tool call where you can.\n\
         * The current date is {date}.\n\
         </SYSTEM_CAPABILITY>\n\n\
         <IMPORTANT>\n\
         * If a login or a captcha blocks progress, stop and ask the user to take over.\n\
         * Finish every task with a short summary of what you did.\n\
         </IMPORTANT>",
        width = display.width,
        height = display.height,
        date = today.format("%A, %B %-d, %Y"),
    )
}

/// Use the configured override when present.
pub fn resolve_system_prompt(configured: Option<&str>, display: DisplaySize) -> String {
    match configured {
        Some(prompt) if !prompt.trim().is_empty() => prompt.to_string(),
        _ => default_system_prompt(display),
    }
}
