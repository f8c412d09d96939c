use std::any::TypeId;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("State not found: {name} ({id:?}), context: {context}")]
    StateNotFound {
        id: TypeId,
        name: &'static str,
        context: String,
    },
    #[error("Command not found: {name} ({id:?}), context: {context}")]
    CommandNotFound {
        id: TypeId,
        name: &'static str,
        context: String,
    },
}

impl Error {
    pub fn state_not_found<T: 'static>(context: impl Into<String>) -> Self {
        Self::StateNotFound {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            context: context.into(),
        }
    }

    pub fn command_not_found<T: 'static>(context: impl Into<String>) -> Self {
        Self::CommandNotFound {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            context: context.into(),
        }
    }
}
