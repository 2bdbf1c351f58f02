//! Accumulation host calls: state mutation through the implications context.

mod checkpoint;
mod eject;
mod forget;
mod new;
mod privilege;
mod provide;
mod solicit;
mod transfer;
mod upgrade;
mod yield_;

pub use checkpoint::CheckpointHostCall;
pub use eject::EjectHostCall;
pub use forget::ForgetHostCall;
pub use new::NewHostCall;
pub use privilege::{AssignHostCall, AutoAccumulateHostCall, BlessHostCall, DesignateHostCall};
pub use provide::ProvideHostCall;
pub use solicit::SolicitHostCall;
pub use transfer::TransferHostCall;
pub use upgrade::UpgradeHostCall;
pub use yield_::YieldHostCall;

use std::collections::HashMap;

use crate::host_functions::base::HostCall;

pub fn register(registry: &mut HashMap<u8, Box<dyn HostCall>>) {
    let mut add = |call: Box<dyn HostCall>| {
        registry.insert(call.id(), call);
    };
    add(Box::new(BlessHostCall));
    add(Box::new(AssignHostCall));
    add(Box::new(DesignateHostCall));
    add(Box::new(CheckpointHostCall));
    add(Box::new(NewHostCall));
    add(Box::new(UpgradeHostCall));
    add(Box::new(TransferHostCall));
    add(Box::new(EjectHostCall));
    add(Box::new(SolicitHostCall));
    add(Box::new(ForgetHostCall));
    add(Box::new(YieldHostCall));
    add(Box::new(ProvideHostCall));
    add(Box::new(AutoAccumulateHostCall));
}
