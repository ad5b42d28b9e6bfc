//! Mock XMPP transport
//!
//! 用于单元测试的 mock 实现，支持注入失败场景并记录每一次调用。

use std::sync::{Arc, Mutex};

use contracts::{AuthResponse, ContractError, SendStatus, SessionTransport};
use tracing::instrument;

/// 记录的 transport 调用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCall {
    Connect { host: String, port: u16 },
    Authenticate { username: String, resource: String },
    Send { recipient: String, body: String },
    Disconnect,
}

/// Mock transport 配置
#[derive(Debug, Default, Clone)]
pub struct MockConfig {
    /// connect 是否失败
    pub fail_connect: bool,
    /// 非 None 时 authenticate 返回该结果
    pub reject_auth: Option<AuthResponse>,
    /// send 失败的 recipients
    pub fail_recipients: Vec<String>,
}

#[derive(Debug, Default)]
struct MockState {
    config: MockConfig,
    calls: Vec<TransportCall>,
    connected: bool,
}

/// Mock transport
///
/// 被 dispatcher 持有后，通过 [`MockHandle`] 查看调用记录或修改配置。
#[derive(Debug)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

/// 共享的 mock 状态句柄
#[derive(Debug, Clone)]
pub struct MockHandle {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    /// 创建默认 mock transport（所有操作成功）
    pub fn new() -> Self {
        Self::with_config(MockConfig::default())
    }

    /// 使用配置创建 mock transport
    pub fn with_config(config: MockConfig) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                config,
                ..MockState::default()
            })),
        }
    }

    /// 获取状态句柄
    pub fn handle(&self) -> MockHandle {
        MockHandle {
            state: Arc::clone(&self.state),
        }
    }
}

impl Default for MockTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl MockHandle {
    /// 所有调用（按顺序）
    pub fn calls(&self) -> Vec<TransportCall> {
        self.state.lock().unwrap().calls.clone()
    }

    /// 清空调用记录
    pub fn clear_calls(&self) {
        self.state.lock().unwrap().calls.clear();
    }

    /// 发送记录 (recipient, body)
    pub fn sent(&self) -> Vec<(String, String)> {
        self.state
            .lock()
            .unwrap()
            .calls
            .iter()
            .filter_map(|call| match call {
                TransportCall::Send { recipient, body } => Some((recipient.clone(), body.clone())),
                _ => None,
            })
            .collect()
    }

    pub fn connect_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Connect { .. }))
    }

    pub fn auth_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Authenticate { .. }))
    }

    pub fn send_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Send { .. }))
    }

    pub fn disconnect_count(&self) -> usize {
        self.count(|call| matches!(call, TransportCall::Disconnect))
    }

    /// 修改配置
    pub fn configure(&self, f: impl FnOnce(&mut MockConfig)) {
        f(&mut self.state.lock().unwrap().config);
    }

    /// 当前连接状态
    pub fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    /// 强制设置连接状态（模拟泄漏的 session）
    pub fn force_connected(&self, connected: bool) {
        self.state.lock().unwrap().connected = connected;
    }

    fn count(&self, pred: impl Fn(&TransportCall) -> bool) -> usize {
        self.state.lock().unwrap().calls.iter().filter(|c| pred(*c)).count()
    }
}

impl SessionTransport for MockTransport {
    #[instrument(name = "mock_transport_connect", skip(self), fields(host = %host, port))]
    fn connect(&mut self, host: &str, port: u16) -> Result<(), ContractError> {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TransportCall::Connect {
            host: host.to_string(),
            port,
        });
        if state.config.fail_connect {
            return Err(ContractError::session_connect(host, port, "mock failure"));
        }
        state.connected = true;
        Ok(())
    }

    #[instrument(name = "mock_transport_authenticate", skip(self, _password))]
    fn authenticate(&mut self, username: &str, _password: &str, resource: &str) -> AuthResponse {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TransportCall::Authenticate {
            username: username.to_string(),
            resource: resource.to_string(),
        });
        state.config.reject_auth.clone().unwrap_or_else(AuthResponse::ok)
    }

    #[instrument(name = "mock_transport_send", skip(self, body), fields(recipient = %recipient))]
    fn send_message(&mut self, recipient: &str, body: &str) -> SendStatus {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TransportCall::Send {
            recipient: recipient.to_string(),
            body: body.to_string(),
        });
        if !state.connected {
            return SendStatus::Failed("not connected".into());
        }
        if state.config.fail_recipients.iter().any(|r| r == recipient) {
            return SendStatus::Failed("mock failure".into());
        }
        SendStatus::Dispatched
    }

    fn is_connected(&self) -> bool {
        self.state.lock().unwrap().connected
    }

    #[instrument(name = "mock_transport_disconnect", skip(self))]
    fn disconnect(&mut self) {
        let mut state = self.state.lock().unwrap();
        state.calls.push(TransportCall::Disconnect);
        state.connected = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_session_cycle() {
        let mut transport = MockTransport::new();
        let handle = transport.handle();

        transport.connect("localhost", 5222).unwrap();
        assert!(transport.is_connected());
        assert!(transport.authenticate("bot", "pw", "res").is_ok());
        assert_eq!(
            transport.send_message("a@example.org", "hi"),
            SendStatus::Dispatched
        );
        transport.disconnect();

        assert!(!handle.is_connected());
        assert_eq!(handle.calls().len(), 4);
        assert_eq!(handle.sent(), vec![("a@example.org".into(), "hi".into())]);
    }

    #[test]
    fn test_mock_injected_failures() {
        let mut transport = MockTransport::with_config(MockConfig {
            fail_connect: true,
            reject_auth: Some(AuthResponse::rejected("not-authorized", "bad password")),
            fail_recipients: vec!["b@example.org".into()],
        });

        assert!(transport.connect("localhost", 5222).is_err());
        assert!(!transport.is_connected());
        assert!(!transport.authenticate("bot", "pw", "res").is_ok());

        transport.handle().force_connected(true);
        assert_eq!(
            transport.send_message("b@example.org", "hi"),
            SendStatus::Failed("mock failure".into())
        );
    }

    #[test]
    fn test_mock_counters_and_clear() {
        let mut transport = MockTransport::new();
        let handle = transport.handle();

        transport.connect("localhost", 5222).unwrap();
        transport.authenticate("bot", "pw", "res");
        transport.authenticate("bot", "pw", "res");
        assert_eq!(handle.auth_count(), 2);
        assert_eq!(handle.connect_count(), 1);

        handle.clear_calls();
        assert!(handle.calls().is_empty());
        assert_eq!(handle.auth_count(), 0);
        // 清空记录不影响连接状态
        assert!(handle.is_connected());
    }
}
