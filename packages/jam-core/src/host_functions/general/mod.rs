//! General host calls, available to every invocation.

mod export;
mod fetch;
mod gas;
mod guest;
mod info;
mod log;
mod lookup;
mod read;
mod write;

pub use export::ExportHostCall;
pub use fetch::FetchHostCall;
pub use gas::GasHostCall;
pub use guest::{ExpungeHostCall, InvokeHostCall, MachineHostCall};
pub use info::InfoHostCall;
pub use log::LogHostCall;
pub use lookup::LookupHostCall;
pub use read::ReadHostCall;
pub use write::WriteHostCall;

use std::collections::HashMap;

use crate::host_functions::base::HostCall;

pub fn register(registry: &mut HashMap<u8, Box<dyn HostCall>>) {
    let mut add = |call: Box<dyn HostCall>| {
        registry.insert(call.id(), call);
    };
    add(Box::new(GasHostCall));
    add(Box::new(FetchHostCall));
    add(Box::new(LookupHostCall));
    add(Box::new(ReadHostCall));
    add(Box::new(WriteHostCall));
    add(Box::new(InfoHostCall));
    add(Box::new(ExportHostCall));
    add(Box::new(MachineHostCall));
    add(Box::new(InvokeHostCall));
    add(Box::new(ExpungeHostCall));
    add(Box::new(LogHostCall));
}
