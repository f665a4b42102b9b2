use clap::ValueEnum;
use codeqa_provider::EmbeddingMode;
use codeqa_search::UserRole;

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum EmbedMode {
    Stub,
    None,
}

impl EmbedMode {
    pub(crate) const fn as_domain(self) -> EmbeddingMode {
        match self {
            EmbedMode::Stub => EmbeddingMode::Stub,
            EmbedMode::None => EmbeddingMode::None,
        }
    }
}

#[derive(Copy, Clone, ValueEnum)]
pub(crate) enum RoleFlag {
    Architect,
    Developer,
    Tester,
    Security,
    Writer,
}

impl RoleFlag {
    pub(crate) const fn as_domain(self) -> UserRole {
        match self {
            RoleFlag::Architect => UserRole::Architect,
            RoleFlag::Developer => UserRole::Developer,
            RoleFlag::Tester => UserRole::Tester,
            RoleFlag::Security => UserRole::Security,
            RoleFlag::Writer => UserRole::Writer,
        }
    }
}
