//! The system prompt that frames every turn.

use chrono::NaiveDate;

/// Build the system prompt for a turn.
///
/// The assistant name comes from the session, so a `remember_name` in one
/// turn shows up in the framing of the next.
pub fn system_prompt(assistant_name: &str, today: NaiveDate) -> String {
    format!(
        "You are {assistant_name}, a helpful personal assistant running in a terminal. \
         Today is {today}.\n\
         Use the available tools for calculations, files, system information, \
         the user's to-do list and preferences. Call a tool whenever it can answer \
         more reliably than you can. When a tool reports an error, explain it to the \
         user in plain words instead of retrying blindly.\n\
         Keep answers short and friendly.",
        today = today.format("%A, %Y-%m-%d"),
    )
}

/// Today's date in local time.
pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
