use threat_intel_core::identity::FunctionIdentity;

/// Fire-and-forget dispatch of a payload to a function.
pub trait SelfInvoker {
    fn invoke_async(&self, target: &FunctionIdentity, payload: &[u8]) -> Result<(), String>;
}
