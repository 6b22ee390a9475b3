use std::collections::HashMap;

use crate::error::SelectionError;
use crate::project::TaskPath;

use super::{BuildConfigurationAction, ConfigurationContext, Next, SelectedTask};

/// Resolves every requested invocation to task paths, attaching its options.
pub struct TaskNameResolvingAction;

impl BuildConfigurationAction for TaskNameResolvingAction {
    fn name(&self) -> &'static str {
        "task-name-resolving"
    }

    fn configure(
        &self,
        ctx: &mut ConfigurationContext<'_>,
        next: Next<'_>,
    ) -> Result<(), SelectionError> {
        let mut index: HashMap<TaskPath, usize> = ctx
            .selected
            .iter()
            .enumerate()
            .map(|(i, t)| (t.path.clone(), i))
            .collect();

        for invocation in &ctx.requested {
            let paths = ctx.selector.select(ctx.start_project(), &invocation.name)?;
            for path in paths {
                match index.get(&path) {
                    Some(&i) => ctx.selected[i].args.extend(invocation.args.iter().cloned()),
                    None => {
                        index.insert(path.clone(), ctx.selected.len());
                        ctx.selected.push(SelectedTask {
                            path,
                            args: invocation.args.clone(),
                        });
                    }
                }
            }
        }
        tracing::debug!(selected = ctx.selected.len(), "resolved task names");

        next.proceed(ctx)
    }
}
