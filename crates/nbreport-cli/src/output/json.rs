use nbreport_core::error::ReportError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), ReportError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
