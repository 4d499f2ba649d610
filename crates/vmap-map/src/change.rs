//! Change notifications emitted by the editor after each successful edit.

use vmap_model::{MappingStatus, NodeId, VariableRef};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelChange {
    GroupAdded(NodeId),
    GroupCopied { source: NodeId, copy: NodeId },
    GroupRemoved(NodeId),
    ConversionAdded { group: NodeId, conversion: NodeId },
    ConversionRemoved { group: NodeId, conversion: NodeId },
    ConversionEdited { group: NodeId, conversion: NodeId },
    OperandTypeChanged { group: NodeId, conversion: NodeId },
    ConditionAdded { group: NodeId, condition: NodeId },
    ConditionRemoved { group: NodeId, condition: NodeId },
    ConditionEdited { group: NodeId, condition: NodeId },
    LogicOperatorChanged(NodeId),
    MappingConditionChanged,
    VariableChanged(VariableRef),
    OptionsLoaded(VariableRef),
    TargetChoiceChanged,
    DescriptionChanged,
    Hydrated,
    Saved,
    StatusChanged(MappingStatus),
    NotesChanged,
}

pub type Listener = Box<dyn FnMut(&ModelChange) + Send>;

/// Fan-out of changes to registered listeners, in registration order.
#[derive(Default)]
pub struct ChangeNotifier {
    listeners: Vec<Listener>,
}

impl ChangeNotifier {
    pub fn subscribe(&mut self, listener: impl FnMut(&ModelChange) + Send + 'static) {
        self.listeners.push(Box::new(listener));
    }

    pub fn len(&self) -> usize {
        self.listeners.len()
    }

    pub fn is_empty(&self) -> bool {
        self.listeners.is_empty()
    }

    pub(crate) fn emit(&mut self, change: ModelChange) {
        tracing::trace!(?change, listeners = self.listeners.len(), "model change");
        for listener in &mut self.listeners {
            listener(&change);
        }
    }
}

impl std::fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}
