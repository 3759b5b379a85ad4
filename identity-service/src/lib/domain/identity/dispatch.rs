use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;

use crate::identity::errors::AuthError;
use crate::identity::models::Introspection;
use crate::identity::models::Principal;
use crate::identity::models::RegisterPrincipal;
use crate::identity::models::TokenPair;
use crate::identity::ports::AuthenticationPort;

/// Explicit routing key for commands.
///
/// Dispatch is keyed on this enum rather than runtime type identity, so a
/// missing registration is a visible wiring mistake, not a downcast surprise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommandKind {
    Login,
    Refresh,
    Register,
    Introspect,
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommandKind::Login => "Login",
            CommandKind::Refresh => "Refresh",
            CommandKind::Register => "Register",
            CommandKind::Introspect => "Introspect",
        };
        f.write_str(name)
    }
}

/// A typed request routed through the dispatcher.
///
/// Commands are transient: created per request, never shared across
/// requests.
#[derive(Debug, Clone)]
pub enum AuthCommand {
    Login { username: String, password: String },
    Refresh { refresh_token: String },
    Register(RegisterPrincipal),
    Introspect { token: String },
}

impl AuthCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            AuthCommand::Login { .. } => CommandKind::Login,
            AuthCommand::Refresh { .. } => CommandKind::Refresh,
            AuthCommand::Register(_) => CommandKind::Register,
            AuthCommand::Introspect { .. } => CommandKind::Introspect,
        }
    }
}

/// The result a handler produces for a command.
#[derive(Debug, Clone)]
pub enum AuthResult {
    Tokens(TokenPair),
    Registered(Principal),
    Introspection(Introspection),
}

/// A handler capable of producing the result for one command kind.
#[async_trait]
pub trait CommandHandler: Send + Sync + 'static {
    async fn handle(&self, command: AuthCommand) -> Result<AuthResult, AuthError>;
}

/// Routing table mapping each command kind to exactly one handler.
///
/// Transport adapters depend only on command/result shapes; the handlers
/// behind the table are invisible to them. Re-registration for a kind
/// silently replaces the previous handler (last write wins).
#[derive(Default)]
pub struct Dispatcher {
    handlers: HashMap<CommandKind, Arc<dyn CommandHandler>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wire a dispatcher with the standard engine-backed handler per
    /// operation.
    pub fn for_engine(engine: Arc<dyn AuthenticationPort>) -> Self {
        let mut dispatcher = Self::new();
        dispatcher.register(CommandKind::Login, Arc::new(LoginHandler(engine.clone())));
        dispatcher.register(
            CommandKind::Refresh,
            Arc::new(RefreshHandler(engine.clone())),
        );
        dispatcher.register(
            CommandKind::Register,
            Arc::new(RegisterHandler(engine.clone())),
        );
        dispatcher.register(CommandKind::Introspect, Arc::new(IntrospectHandler(engine)));
        dispatcher
    }

    /// Bind a handler for a command kind, replacing any previous binding.
    pub fn register(&mut self, kind: CommandKind, handler: Arc<dyn CommandHandler>) {
        self.handlers.insert(kind, handler);
    }

    /// Route a command to its handler and invoke it.
    ///
    /// # Errors
    /// * `UnroutableCommand` - No handler bound for this kind. A correctly
    ///   wired system never hits this; it signals a programmer error.
    pub async fn dispatch(&self, command: AuthCommand) -> Result<AuthResult, AuthError> {
        let kind = command.kind();

        let handler = self
            .handlers
            .get(&kind)
            .ok_or(AuthError::UnroutableCommand(kind))?;

        handler.handle(command).await
    }
}

struct LoginHandler(Arc<dyn AuthenticationPort>);

#[async_trait]
impl CommandHandler for LoginHandler {
    async fn handle(&self, command: AuthCommand) -> Result<AuthResult, AuthError> {
        let kind = command.kind();
        let AuthCommand::Login { username, password } = command else {
            return Err(AuthError::UnroutableCommand(kind));
        };

        let principal = self.0.login(&username, &password).await?;
        let tokens = self.0.issue_token_pair(&principal).await?;

        Ok(AuthResult::Tokens(tokens))
    }
}

struct RefreshHandler(Arc<dyn AuthenticationPort>);

#[async_trait]
impl CommandHandler for RefreshHandler {
    async fn handle(&self, command: AuthCommand) -> Result<AuthResult, AuthError> {
        let kind = command.kind();
        let AuthCommand::Refresh { refresh_token } = command else {
            return Err(AuthError::UnroutableCommand(kind));
        };

        Ok(AuthResult::Tokens(self.0.refresh(&refresh_token).await?))
    }
}

struct RegisterHandler(Arc<dyn AuthenticationPort>);

#[async_trait]
impl CommandHandler for RegisterHandler {
    async fn handle(&self, command: AuthCommand) -> Result<AuthResult, AuthError> {
        let kind = command.kind();
        let AuthCommand::Register(register) = command else {
            return Err(AuthError::UnroutableCommand(kind));
        };

        Ok(AuthResult::Registered(self.0.register(register).await?))
    }
}

struct IntrospectHandler(Arc<dyn AuthenticationPort>);

#[async_trait]
impl CommandHandler for IntrospectHandler {
    async fn handle(&self, command: AuthCommand) -> Result<AuthResult, AuthError> {
        let kind = command.kind();
        let AuthCommand::Introspect { token } = command else {
            return Err(AuthError::UnroutableCommand(kind));
        };

        Ok(AuthResult::Introspection(self.0.introspect(&token).await?))
    }
}
