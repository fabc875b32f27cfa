//! The full command reference shown by the `commands` stock command.

use command_manual_syntax::render;
use tracing::debug;

use crate::dispatcher::Dispatcher;
use crate::interaction::Interaction;
use crate::permissions::allowed;
use crate::store::ConnectionSource;

impl<C: ConnectionSource> Dispatcher<C> {
    /// Renders every served manual for `viewer`, under `prefix`.
    ///
    /// The stock section comes first, then one section per module. Modules
    /// that hide when the viewer is not allowed are left out, and so are
    /// module commands that hide themselves from the viewer.
    pub fn manual_document(&self, viewer: &dyn Interaction, prefix: &str) -> String {
        let mut sections = Vec::new();

        let stock: Vec<String> = self
            .stock_commands()
            .iter()
            .map(|command| render(&command.manual, prefix))
            .collect();
        if stock.is_empty() {
            debug!("manual document has no stock section");
        } else {
            sections.push(stock.join("\n\n"));
        }

        for module in self.modules() {
            let module_allowed = allowed(viewer, module.permissions.as_ref());
            if !module_allowed && module.hide_when_contradicts_permissions {
                debug!(module = %module.name, "hiding module from manual document");
                continue;
            }

            let mut heading = format!("Module {}", module.name);
            if module.servers_are_universes {
                heading.push_str("\n(Module commands don't carry data between servers)");
            }
            let mut entries = vec![heading];
            for command in module.commands() {
                if command.no_use_no_see && !allowed(viewer, command.permissions.as_ref()) {
                    debug!(command = %command.name(), "hiding command from manual document");
                    continue;
                }
                entries.push(render(&command.manual, prefix));
            }
            sections.push(entries.join("\n\n"));
        }

        let title = format!("{} Command Manual", self.bot_name());
        format!(
            "{title}\n{}\nLocal Prefix - {prefix}\nNote: The prefix shown in this manual is only for this server.\nThe global prefix is {}, but this may be overridden by individual servers.\n\n\n{}",
            "=".repeat(title.chars().count()),
            self.global_prefix(),
            sections.join("\n\n\n")
        )
    }
}
