use ptrab_core::error::PtrabError;
use serde::Serialize;

pub fn print<T: Serialize>(value: &T) -> Result<(), PtrabError> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{json}");
    Ok(())
}
