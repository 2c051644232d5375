//! Request-cycle commands: each resolves the session from the inbound
//! token, acts on it and ends the cycle the way a request handler would.

use anyhow::Result;
use clap::Args;
use console::Style;
use satchel_session::{CookieExchange, Error, Session};
use serde::Serialize;
use serde_json::{Map, Value};

use super::Context;

/// Arguments for the set command.
#[derive(Args, Debug)]
pub struct SetArgs {
    /// Key to set
    pub key: String,

    /// Value; parsed as JSON, otherwise stored as a string
    pub value: String,
}

/// Arguments for the get command.
#[derive(Args, Debug)]
pub struct GetArgs {
    /// Only show this key
    pub key: Option<String>,
}

/// Arguments for the delete command.
#[derive(Args, Debug)]
pub struct DeleteArgs {
    /// Key to remove
    pub key: String,
}

/// Outcome of one cycle for output.
#[derive(Debug, Serialize)]
struct CycleOutput {
    session_id: String,
    fresh: bool,
    data: Map<String, Value>,
    set_cookie: Vec<String>,
}

impl CycleOutput {
    fn capture(session: &Session<'_>) -> Self {
        Self {
            session_id: session.id().to_string(),
            fresh: session.fresh(),
            data: session
                .record()
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
            set_cookie: Vec::new(),
        }
    }

    fn with_cookies(mut self, exchange: &CookieExchange) -> Self {
        self.set_cookie = exchange
            .response()
            .iter()
            .map(|d| d.to_header_value())
            .collect();
        self
    }
}

/// Parse a CLI value as JSON, falling back to a plain string.
fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

/// Set a key and save.
pub fn set(args: SetArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let mut exchange = ctx.exchange();

    let mut session = store.get(&exchange)?;
    session.set(args.key, parse_value(&args.value));
    let output = CycleOutput::capture(&session);
    session.save(&mut exchange).map_err(Error::from)?;

    print_cycle(ctx, &output.with_cookies(&exchange))
}

/// Show the session without ending it.
pub fn get(args: GetArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let exchange = ctx.exchange();
    let session = store.get(&exchange)?;

    match args.key {
        Some(key) => {
            let value = session.get(&key).cloned().unwrap_or(Value::Null);
            if ctx.json_output {
                println!("{}", serde_json::to_string_pretty(&value)?);
            } else {
                println!("{value}");
            }
            Ok(())
        }
        None => print_cycle(ctx, &CycleOutput::capture(&session)),
    }
}

/// Remove a key and save; removing the last key destroys the session.
pub fn delete(args: DeleteArgs, ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let mut exchange = ctx.exchange();

    let mut session = store.get(&exchange)?;
    session.delete(&args.key);

    // An empty record is never written, so drop the stored copy instead
    if session.is_empty() {
        session.destroy(&mut exchange)?;
        let output = CycleOutput::capture(&session);
        return print_cycle(ctx, &output.with_cookies(&exchange));
    }

    let output = CycleOutput::capture(&session);
    session.save(&mut exchange).map_err(Error::from)?;
    print_cycle(ctx, &output.with_cookies(&exchange))
}

/// Destroy the session.
pub fn destroy(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let mut exchange = ctx.exchange();

    let mut session = store.get(&exchange)?;
    session.destroy(&mut exchange)?;

    let output = CycleOutput::capture(&session);
    print_cycle(ctx, &output.with_cookies(&exchange))
}

/// Rotate the identifier and save under the new one.
pub fn regenerate(ctx: &Context) -> Result<()> {
    let store = ctx.store()?;
    let mut exchange = ctx.exchange();

    let mut session = store.get(&exchange)?;
    session.regenerate()?;
    let output = CycleOutput::capture(&session);
    session.save(&mut exchange).map_err(Error::from)?;

    print_cycle(ctx, &output.with_cookies(&exchange))
}

fn print_cycle(ctx: &Context, output: &CycleOutput) -> Result<()> {
    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(output)?);
        return Ok(());
    }

    let dim = Style::new().dim();
    let green = Style::new().green();

    println!("  {} {}", dim.apply_to("Session:"), output.session_id);
    println!(
        "  {} {}",
        dim.apply_to("Fresh:  "),
        if output.fresh { "yes" } else { "no" }
    );

    if output.data.is_empty() {
        println!("  {} (empty)", dim.apply_to("Data:   "));
    } else {
        println!("  {}", dim.apply_to("Data:"));
        for (key, value) in &output.data {
            println!("    {} = {}", key, value);
        }
    }

    for cookie in &output.set_cookie {
        println!("  {} {}", dim.apply_to("Set-Cookie:"), green.apply_to(cookie));
    }

    Ok(())
}
