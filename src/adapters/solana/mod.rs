pub mod listener;
pub mod rpc;
pub mod wallet;

pub use listener::{AccountListener, ListenerHandles};
pub use rpc::RpcGateway;
pub use wallet::WalletManager;
