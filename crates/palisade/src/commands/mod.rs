//! Command dispatch: bridges CLI args -> engine requests -> output.

pub mod config_cmd;
pub mod objects;
pub mod sequence;

use std::sync::Arc;

use palisade_core::{ConfigEngine, DeviceContext, ObjectType};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a gateway-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    engine: &Arc<ConfigEngine>,
    context: DeviceContext,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Address(args) => {
            objects::handle(engine, ObjectType::Address, args, context, global).await
        }
        Command::AddressGroup(args) => {
            objects::handle(engine, ObjectType::AddressGroup, args, context, global).await
        }
        Command::Service(args) => {
            objects::handle(engine, ObjectType::Service, args, context, global).await
        }
        Command::ServiceGroup(args) => {
            objects::handle(engine, ObjectType::ServiceGroup, args, context, global).await
        }
        Command::Rule(args) => {
            objects::handle(engine, ObjectType::SecurityRule, args, context, global).await
        }
        Command::Tag(args) => {
            objects::handle(engine, ObjectType::Tag, args, context, global).await
        }
        Command::Sequence(args) => sequence::handle(engine, args, context, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
