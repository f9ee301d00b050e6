use anyhow::Result;
use serde::Serialize;
use serde_json::json;
use std::io::{self, Write};

#[derive(Serialize)]
pub struct Meta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u128>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
}

pub fn print_plan<T: Serialize>(op: &str, plan: &T, meta: Option<Meta>) -> Result<()> {
    let env = plan_envelope(op, plan, meta)?;
    write_line(&env)
}

pub fn print_result<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<()> {
    let env = result_envelope(op, result, meta)?;
    write_line(&env)
}

fn plan_envelope<T: Serialize>(op: &str, plan: &T, meta: Option<Meta>) -> Result<serde_json::Value> {
    Ok(json!({ "op": op, "apply": false, "plan": serde_json::to_value(plan)?, "meta": meta }))
}

fn result_envelope<T: Serialize>(op: &str, result: &T, meta: Option<Meta>) -> Result<serde_json::Value> {
    Ok(json!({ "op": op, "apply": true, "result": serde_json::to_value(result)?, "meta": meta }))
}

fn write_line(env: &serde_json::Value) -> Result<()> {
    let mut out = io::stdout();
    serde_json::to_writer(&mut out, env)?;
    writeln!(&mut out)?;
    Ok(())
}
