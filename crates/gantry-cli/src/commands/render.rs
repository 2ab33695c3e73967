//! Render command - print concrete manifests without touching a cluster

use clap::Args;

use gantry_component::{render_manifests, Component, OptionsProvider, Redis};

use super::RedisArgs;
use crate::Result;

/// Render command arguments
#[derive(Args, Debug)]
pub struct RenderArgs {
    #[command(flatten)]
    pub redis: RedisArgs,
}

/// Assemble and serialize the desired objects
pub fn manifests(args: &RenderArgs) -> Result<String> {
    let options = args.redis.provider().provide()?;
    let objects = Redis::new(options).assemble();
    Ok(render_manifests(&objects)?)
}

pub fn run(args: RenderArgs) -> Result<()> {
    print!("{}", manifests(&args)?);
    Ok(())
}
