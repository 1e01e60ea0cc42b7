use sea_orm_migration::prelude::*;
use sea_orm_migration::sea_orm::DatabaseBackend;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Users::Table)
                    .col(pk_id_col(manager, Users::Id))
                    .col(uuid_col(Users::Uuid))
                    .col(ColumnDef::new(Users::Email).string().not_null())
                    .col(ColumnDef::new(Users::PasswordHash).string().not_null())
                    .col(ColumnDef::new(Users::FirstName).string().not_null())
                    .col(ColumnDef::new(Users::LastName).string().not_null())
                    .col(timestamp_col(Users::CreatedAt))
                    .col(timestamp_col(Users::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_users_uuid")
                    .table(Users::Table)
                    .col(Users::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_users_email")
                    .table(Users::Table)
                    .col(Users::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Roles::Table)
                    .col(pk_id_col(manager, Roles::Id))
                    .col(uuid_col(Roles::Uuid))
                    .col(ColumnDef::new(Roles::Name).string_len(32).not_null())
                    .col(timestamp_col(Roles::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_roles_uuid")
                    .table(Roles::Table)
                    .col(Roles::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_roles_name")
                    .table(Roles::Table)
                    .col(Roles::Name)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(UserRoles::Table)
                    .col(pk_id_col(manager, UserRoles::Id))
                    .col(fk_id_col(manager, UserRoles::UserId))
                    .col(fk_id_col(manager, UserRoles::RoleId))
                    .col(timestamp_col(UserRoles::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_user_id")
                            .from(UserRoles::Table, UserRoles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_roles_role_id")
                            .from(UserRoles::Table, UserRoles::RoleId)
                            .to(Roles::Table, Roles::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_roles_user_id_role_id")
                    .table(UserRoles::Table)
                    .col(UserRoles::UserId)
                    .col(UserRoles::RoleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(UserProfiles::Table)
                    .col(pk_id_col(manager, UserProfiles::Id))
                    .col(uuid_col(UserProfiles::Uuid))
                    .col(fk_id_col(manager, UserProfiles::UserId))
                    .col(ColumnDef::new(UserProfiles::Phone).string())
                    .col(ColumnDef::new(UserProfiles::Address).string())
                    .col(ColumnDef::new(UserProfiles::Bio).text())
                    .col(timestamp_col(UserProfiles::CreatedAt))
                    .col(timestamp_col(UserProfiles::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_user_profiles_user_id")
                            .from(UserProfiles::Table, UserProfiles::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_profiles_uuid")
                    .table(UserProfiles::Table)
                    .col(UserProfiles::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_profiles_user_id")
                    .table(UserProfiles::Table)
                    .col(UserProfiles::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(UserRequests::Table)
                    .col(pk_id_col(manager, UserRequests::Id))
                    .col(uuid_col(UserRequests::Uuid))
                    .col(ColumnDef::new(UserRequests::Email).string().not_null())
                    .col(ColumnDef::new(UserRequests::PasswordHash).string().not_null())
                    .col(ColumnDef::new(UserRequests::FirstName).string().not_null())
                    .col(ColumnDef::new(UserRequests::LastName).string().not_null())
                    .col(
                        ColumnDef::new(UserRequests::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(ColumnDef::new(UserRequests::ReviewComment).text())
                    .col(ColumnDef::new(UserRequests::ReviewedAt).timestamp())
                    .col(timestamp_col(UserRequests::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_requests_uuid")
                    .table(UserRequests::Table)
                    .col(UserRequests::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_user_requests_status")
                    .table(UserRequests::Table)
                    .col(UserRequests::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Projects::Table)
                    .col(pk_id_col(manager, Projects::Id))
                    .col(uuid_col(Projects::Uuid))
                    .col(ColumnDef::new(Projects::Name).string().not_null())
                    .col(ColumnDef::new(Projects::Description).text())
                    .col(timestamp_col(Projects::CreatedAt))
                    .col(timestamp_col(Projects::UpdatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_projects_uuid")
                    .table(Projects::Table)
                    .col(Projects::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Milestones::Table)
                    .col(pk_id_col(manager, Milestones::Id))
                    .col(uuid_col(Milestones::Uuid))
                    .col(fk_id_col(manager, Milestones::ProjectId))
                    .col(ColumnDef::new(Milestones::Name).string().not_null())
                    .col(ColumnDef::new(Milestones::Description).text())
                    .col(ColumnDef::new(Milestones::Budget).double())
                    .col(ColumnDef::new(Milestones::Deadline).timestamp())
                    .col(
                        ColumnDef::new(Milestones::Completed)
                            .boolean()
                            .not_null()
                            .default(Expr::val(false)),
                    )
                    .col(ColumnDef::new(Milestones::ClosedAt).timestamp())
                    .col(timestamp_col(Milestones::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_milestones_project_id")
                            .from(Milestones::Table, Milestones::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_milestones_uuid")
                    .table(Milestones::Table)
                    .col(Milestones::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_milestones_project_id")
                    .table(Milestones::Table)
                    .col(Milestones::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Teams::Table)
                    .col(pk_id_col(manager, Teams::Id))
                    .col(uuid_col(Teams::Uuid))
                    .col(ColumnDef::new(Teams::Name).string().not_null())
                    .col(ColumnDef::new(Teams::Description).text())
                    .col(timestamp_col(Teams::CreatedAt))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_teams_uuid")
                    .table(Teams::Table)
                    .col(Teams::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(TeamEmployees::Table)
                    .col(pk_id_col(manager, TeamEmployees::Id))
                    .col(fk_id_col(manager, TeamEmployees::TeamId))
                    .col(fk_id_col(manager, TeamEmployees::UserId))
                    .col(timestamp_col(TeamEmployees::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_employees_team_id")
                            .from(TeamEmployees::Table, TeamEmployees::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_team_employees_user_id")
                            .from(TeamEmployees::Table, TeamEmployees::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_team_employees_team_id_user_id")
                    .table(TeamEmployees::Table)
                    .col(TeamEmployees::TeamId)
                    .col(TeamEmployees::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(ProjectTeams::Table)
                    .col(pk_id_col(manager, ProjectTeams::Id))
                    .col(fk_id_col(manager, ProjectTeams::ProjectId))
                    .col(fk_id_col(manager, ProjectTeams::TeamId))
                    .col(timestamp_col(ProjectTeams::CreatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_teams_project_id")
                            .from(ProjectTeams::Table, ProjectTeams::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_project_teams_team_id")
                            .from(ProjectTeams::Table, ProjectTeams::TeamId)
                            .to(Teams::Table, Teams::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One team per project; concurrent assigns race to this index.
        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_project_teams_project_id")
                    .table(ProjectTeams::Table)
                    .col(ProjectTeams::ProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Tasks::Table)
                    .col(pk_id_col(manager, Tasks::Id))
                    .col(uuid_col(Tasks::Uuid))
                    .col(fk_id_col(manager, Tasks::ProjectId))
                    .col(fk_id_nullable_col(manager, Tasks::MilestoneId))
                    .col(fk_id_col(manager, Tasks::AssignedEmployeeId))
                    .col(ColumnDef::new(Tasks::Title).string().not_null())
                    .col(ColumnDef::new(Tasks::Description).text())
                    .col(
                        ColumnDef::new(Tasks::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("pending")),
                    )
                    .col(timestamp_col(Tasks::CreatedAt))
                    .col(timestamp_col(Tasks::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_project_id")
                            .from(Tasks::Table, Tasks::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_milestone_id")
                            .from(Tasks::Table, Tasks::MilestoneId)
                            .to(Milestones::Table, Milestones::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_tasks_assigned_employee_id")
                            .from(Tasks::Table, Tasks::AssignedEmployeeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_uuid")
                    .table(Tasks::Table)
                    .col(Tasks::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_project_id")
                    .table(Tasks::Table)
                    .col(Tasks::ProjectId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_assigned_employee_id")
                    .table(Tasks::Table)
                    .col(Tasks::AssignedEmployeeId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_tasks_status")
                    .table(Tasks::Table)
                    .col(Tasks::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(TaskSubmissions::Table)
                    .col(pk_id_col(manager, TaskSubmissions::Id))
                    .col(uuid_col(TaskSubmissions::Uuid))
                    .col(fk_id_col(manager, TaskSubmissions::TaskId))
                    .col(fk_id_col(manager, TaskSubmissions::EmployeeId))
                    .col(ColumnDef::new(TaskSubmissions::FilePath).string())
                    .col(ColumnDef::new(TaskSubmissions::Comment).text())
                    .col(
                        ColumnDef::new(TaskSubmissions::Status)
                            .string_len(32)
                            .not_null()
                            .default(Expr::val("submitted")),
                    )
                    .col(ColumnDef::new(TaskSubmissions::QaComment).text())
                    .col(ColumnDef::new(TaskSubmissions::ReviewedAt).timestamp())
                    .col(timestamp_col(TaskSubmissions::SubmittedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_submissions_task_id")
                            .from(TaskSubmissions::Table, TaskSubmissions::TaskId)
                            .to(Tasks::Table, Tasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_task_submissions_employee_id")
                            .from(TaskSubmissions::Table, TaskSubmissions::EmployeeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_submissions_uuid")
                    .table(TaskSubmissions::Table)
                    .col(TaskSubmissions::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_task_submissions_task_id")
                    .table(TaskSubmissions::Table)
                    .col(TaskSubmissions::TaskId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(EmployeePerformances::Table)
                    .col(pk_id_col(manager, EmployeePerformances::Id))
                    .col(uuid_col(EmployeePerformances::Uuid))
                    .col(fk_id_col(manager, EmployeePerformances::EmployeeId))
                    .col(fk_id_col(manager, EmployeePerformances::ProjectId))
                    .col(
                        ColumnDef::new(EmployeePerformances::TasksAssigned)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(
                        ColumnDef::new(EmployeePerformances::TasksCompleted)
                            .integer()
                            .not_null()
                            .default(Expr::val(0)),
                    )
                    .col(
                        ColumnDef::new(EmployeePerformances::ApprovalRate)
                            .double()
                            .not_null()
                            .default(Expr::val(0.0)),
                    )
                    .col(timestamp_col(EmployeePerformances::GeneratedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_performances_employee_id")
                            .from(EmployeePerformances::Table, EmployeePerformances::EmployeeId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employee_performances_project_id")
                            .from(EmployeePerformances::Table, EmployeePerformances::ProjectId)
                            .to(Projects::Table, Projects::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_employee_performances_uuid")
                    .table(EmployeePerformances::Table)
                    .col(EmployeePerformances::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_employee_performances_employee_id_project_id")
                    .table(EmployeePerformances::Table)
                    .col(EmployeePerformances::EmployeeId)
                    .col(EmployeePerformances::ProjectId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create().if_not_exists()
                    .table(Resumes::Table)
                    .col(pk_id_col(manager, Resumes::Id))
                    .col(uuid_col(Resumes::Uuid))
                    .col(fk_id_col(manager, Resumes::UserId))
                    .col(ColumnDef::new(Resumes::FileName).string().not_null())
                    .col(ColumnDef::new(Resumes::Parsed).text())
                    .col(timestamp_col(Resumes::CreatedAt))
                    .col(timestamp_col(Resumes::UpdatedAt))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_resumes_user_id")
                            .from(Resumes::Table, Resumes::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_resumes_uuid")
                    .table(Resumes::Table)
                    .col(Resumes::Uuid)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create().if_not_exists()
                    .name("idx_resumes_user_id")
                    .table(Resumes::Table)
                    .col(Resumes::UserId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for table in [
            "resumes",
            "employee_performances",
            "task_submissions",
            "tasks",
            "project_teams",
            "team_employees",
            "teams",
            "milestones",
            "projects",
            "user_requests",
            "user_profiles",
            "user_roles",
            "roles",
            "users",
        ] {
            manager
                .drop_table(Table::drop().table(Alias::new(table)).if_exists().to_owned())
                .await?;
        }
        Ok(())
    }
}

fn pk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().auto_increment().primary_key().to_owned()
}

fn fk_id_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.not_null().to_owned()
}

fn fk_id_nullable_col<T: Iden>(manager: &SchemaManager, col: T) -> ColumnDef {
    let mut col = ColumnDef::new(col);
    match manager.get_database_backend() {
        DatabaseBackend::Sqlite => {
            col.integer();
        }
        _ => {
            col.big_integer();
        }
    }
    col.to_owned()
}

fn uuid_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col).uuid().not_null().to_owned()
}

fn timestamp_col<T: Iden>(col: T) -> ColumnDef {
    ColumnDef::new(col)
        .timestamp()
        .not_null()
        .default(Expr::current_timestamp())
        .to_owned()
}

#[derive(Iden)]
enum Users {
    Table,
    Id,
    Uuid,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Roles {
    Table,
    Id,
    Uuid,
    Name,
    CreatedAt,
}

#[derive(Iden)]
enum UserRoles {
    Table,
    Id,
    UserId,
    RoleId,
    CreatedAt,
}

#[derive(Iden)]
enum UserProfiles {
    Table,
    Id,
    Uuid,
    UserId,
    Phone,
    Address,
    Bio,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum UserRequests {
    Table,
    Id,
    Uuid,
    Email,
    PasswordHash,
    FirstName,
    LastName,
    Status,
    ReviewComment,
    ReviewedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Projects {
    Table,
    Id,
    Uuid,
    Name,
    Description,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum Milestones {
    Table,
    Id,
    Uuid,
    ProjectId,
    Name,
    Description,
    Budget,
    Deadline,
    Completed,
    ClosedAt,
    CreatedAt,
}

#[derive(Iden)]
enum Teams {
    Table,
    Id,
    Uuid,
    Name,
    Description,
    CreatedAt,
}

#[derive(Iden)]
enum TeamEmployees {
    Table,
    Id,
    TeamId,
    UserId,
    CreatedAt,
}

#[derive(Iden)]
enum ProjectTeams {
    Table,
    Id,
    ProjectId,
    TeamId,
    CreatedAt,
}

#[derive(Iden)]
enum Tasks {
    Table,
    Id,
    Uuid,
    ProjectId,
    MilestoneId,
    AssignedEmployeeId,
    Title,
    Description,
    Status,
    CreatedAt,
    UpdatedAt,
}

#[derive(Iden)]
enum TaskSubmissions {
    Table,
    Id,
    Uuid,
    TaskId,
    EmployeeId,
    FilePath,
    Comment,
    Status,
    QaComment,
    ReviewedAt,
    SubmittedAt,
}

#[derive(Iden)]
enum EmployeePerformances {
    Table,
    Id,
    Uuid,
    EmployeeId,
    ProjectId,
    TasksAssigned,
    TasksCompleted,
    ApprovalRate,
    GeneratedAt,
}

#[derive(Iden)]
enum Resumes {
    Table,
    Id,
    Uuid,
    UserId,
    FileName,
    Parsed,
    CreatedAt,
    UpdatedAt,
}
