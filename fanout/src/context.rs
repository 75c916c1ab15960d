use std::fmt;

/// A subscription dimension.
///
/// Contexts are a closed, code-controlled set: the well-known variants plus
/// `Custom` for application-defined dimensions named by a static string. The
/// values scoped under a context are open-ended runtime strings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Context {
    /// Remote host of the connection. Populated automatically on connect.
    Host,
    /// Authenticated user identity, bound by business logic.
    User,
    Custom(&'static str),
}

/// The context every connection is subscribed to on connect.
pub const HOST_CONTEXT: Context = Context::Host;

impl Context {
    pub fn name(&self) -> &'static str {
        match self {
            Context::Host => "host",
            Context::User => "user",
            Context::Custom(name) => name,
        }
    }
}

impl fmt::Display for Context {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}
