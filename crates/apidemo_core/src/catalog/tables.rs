//! Tables, metatables, and globals.

use apidemo_foundation::Result;
use apidemo_host::LuaState;

use super::{Args, Ret};

pub(super) fn create_table(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.create_table(args.int(0)?, args.int(1)?);
    Ok(Ret::None)
}

pub(super) fn new_table(state: &mut LuaState, _: &Args) -> Result<Ret> {
    state.new_table();
    Ok(Ret::None)
}

pub(super) fn get_field(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.get_field(args.int(0)?, args.str(1)?)?;
    Ok(Ret::None)
}

pub(super) fn get_global(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.get_global(args.str(0)?)?;
    Ok(Ret::None)
}

pub(super) fn get_table(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.get_table(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn set_field(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.set_field(args.int(0)?, args.str(1)?)?;
    Ok(Ret::None)
}

pub(super) fn set_global(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.set_global(args.str(0)?)?;
    Ok(Ret::None)
}

pub(super) fn set_table(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.set_table(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn raw_get(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.raw_get(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn raw_geti(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.raw_geti(args.int(0)?, args.int(1)?)?;
    Ok(Ret::None)
}

pub(super) fn raw_set(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.raw_set(args.int(0)?)?;
    Ok(Ret::None)
}

pub(super) fn raw_seti(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.raw_seti(args.int(0)?, args.int(1)?)?;
    Ok(Ret::None)
}

pub(super) fn next(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.next(args.int(0)?)?))
}

/// `lua_objlen` and `lua_rawlen`.
pub(super) fn objlen(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::size(state.objlen(args.int(0)?)))
}

pub(super) fn get_metatable(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.get_metatable(args.int(0)?)))
}

pub(super) fn set_metatable(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.set_metatable(args.int(0)?)?))
}

pub(super) fn get_metafield(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.get_metafield(args.int(0)?, args.str(1)?)))
}

pub(super) fn new_metatable(state: &mut LuaState, args: &Args) -> Result<Ret> {
    Ok(Ret::flag(state.new_metatable(args.str(0)?)))
}

pub(super) fn get_named_metatable(state: &mut LuaState, args: &Args) -> Result<Ret> {
    state.get_named_metatable(args.str(0)?);
    Ok(Ret::None)
}
