use crate::endpoints::{
    UserRef,
    campus::{GetCampus, ListCampus},
    cursus::{ListCursus, ListCursusUsers},
    project_sessions::GetProjectSession,
    projects::{GetProject, ListProjects, ListUserProjects},
    quests::ListUserQuests,
    token::GetTokenInfo,
    users::{GetMe, GetUser, ListCampusUsers, ListUsers},
};

pub struct UserRepository;

impl UserRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn me(&self) -> GetMe {
        GetMe
    }

    pub fn get(&self, user: impl Into<UserRef>) -> GetUser {
        GetUser::new(user)
    }

    pub fn list(&self) -> ListUsers {
        ListUsers::new()
    }

    pub fn in_campus(&self, campus_id: u64) -> ListCampusUsers {
        ListCampusUsers::new(campus_id)
    }

    pub fn projects(&self, user: impl Into<UserRef>) -> ListUserProjects {
        ListUserProjects::new(user)
    }

    pub fn quests(&self, user: impl Into<UserRef>) -> ListUserQuests {
        ListUserQuests::new(user)
    }
}

pub struct ProjectRepository;

impl ProjectRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self) -> ListProjects {
        ListProjects::new()
    }

    pub fn get(&self, project: impl ToString) -> GetProject {
        GetProject::new(project)
    }

    pub fn session(&self, session_id: u64) -> GetProjectSession {
        GetProjectSession::new(session_id)
    }
}

pub struct CampusRepository;

impl CampusRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self) -> ListCampus {
        ListCampus::new()
    }

    pub fn get(&self, campus_id: u64) -> GetCampus {
        GetCampus::new(campus_id)
    }
}

pub struct CursusRepository;

impl CursusRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn list(&self) -> ListCursus {
        ListCursus::new()
    }

    pub fn users(&self, cursus_id: u64) -> ListCursusUsers {
        ListCursusUsers::new(cursus_id)
    }
}

pub struct TokenRepository;

impl TokenRepository {
    pub fn new() -> Self {
        Self {}
    }

    pub fn info(&self) -> GetTokenInfo {
        GetTokenInfo
    }
}
