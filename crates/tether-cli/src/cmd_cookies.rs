/// `tether cookies <VALUE>...`
pub fn execute(values: &[String]) -> anyhow::Result<()> {
    let header = if values.is_empty() { None } else { Some(values) };
    let cookies = tether_core::parse_set_cookies(header);
    println!("{}", serde_json::to_string_pretty(&cookies)?);
    Ok(())
}
