//! CLI 子命令实现

mod listen;
mod send;

pub use listen::ListenCommand;
pub use send::SendCommand;
