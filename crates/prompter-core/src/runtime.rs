use crate::{DisplayEvent, HostLinkEvent};

/// Where the prompter actor reports everything a user should see.
pub trait PrompterRuntime: Send + Sync + 'static {
    fn emit_display(&self, event: DisplayEvent);
    fn emit_status(&self, status: &str);
    fn emit_link(&self, event: HostLinkEvent);
}
