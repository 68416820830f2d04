pub mod category;
pub mod edit;
pub mod sheet;
pub mod system;

use crate::cli::registry::CommandRegistry;

pub(crate) fn register_all(registry: &mut CommandRegistry) {
    let definitions = system::definitions()
        .into_iter()
        .chain(sheet::definitions())
        .chain(edit::definitions())
        .chain(category::definitions());
    for entry in definitions {
        registry.register(entry);
    }
}
