use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rust_decimal::Decimal;
use uuid::Uuid;

use goal_stake::{
    application::usecases::{
        errors::UseCaseError, goals::GoalsUseCase, instructor::InstructorUseCase,
        submissions::SubmissionsUseCase,
    },
    domain::{
        entities::{
            daily_submissions::{
                DailySubmissionEntity, InsertDailySubmissionEntity, ReviewDailySubmissionEntity,
            },
            goals::{AdminUpdateGoalEntity, GoalEntity, InsertGoalEntity},
            payments::{InsertPaymentEntity, PaymentEntity},
            users::{EditUserEntity, InsertUserEntity, UserEntity},
        },
        repositories::{
            daily_submissions::DailySubmissionRepository, goals::GoalRepository,
            payment_gateways::PaymentGateway, payments::PaymentRepository, storage::FileStorage,
            users::UserRepository,
        },
        value_objects::{
            due_dates::NextDue,
            enums::{
                goal_statuses::GoalStatus, payment_statuses::PaymentStatus, roles::Role,
                sort_order::SortOrder, submission_statuses::SubmissionStatus,
            },
            goals::{AssignGoalModel, CreateGoalModel, FinalizeGoalModel, StartGoalModel},
            iam::RequestContext,
            payments::HoldRequest,
            submissions::{
                ReviewSubmissionModel, SubmissionUpsert, SubmitDailyModel, UploadedFile,
            },
        },
    },
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserEntity>,
    goals: HashMap<Uuid, GoalEntity>,
    payments: HashMap<Uuid, PaymentEntity>,
    submissions: HashMap<Uuid, DailySubmissionEntity>,
}

/// One in-memory database standing in for every repository.
#[derive(Default)]
struct InMemoryDb {
    tables: Mutex<Tables>,
}

impl InMemoryDb {
    fn goal(&self, goal_id: Uuid) -> GoalEntity {
        self.tables.lock().unwrap().goals[&goal_id].clone()
    }

    fn payment_for(&self, goal_id: Uuid) -> PaymentEntity {
        self.tables
            .lock()
            .unwrap()
            .payments
            .values()
            .find(|payment| payment.goal_id == goal_id)
            .cloned()
            .unwrap()
    }
}

#[async_trait]
impl GoalRepository for InMemoryDb {
    async fn create_with_stake(
        &self,
        goal: InsertGoalEntity,
        payment: InsertPaymentEntity,
    ) -> Result<(GoalEntity, PaymentEntity)> {
        let now = Utc::now();
        let goal = GoalEntity {
            id: goal.id,
            title: goal.title,
            description: goal.description,
            duration_days: goal.duration_days,
            stake_amount_minor: goal.stake_amount_minor,
            currency: goal.currency,
            start_date: goal.start_date,
            started_at: None,
            end_date: None,
            utc_offset_minutes: 0,
            status: goal.status,
            user_id: goal.user_id,
            instructor_id: None,
            created_at: now,
            updated_at: now,
        };
        let payment = PaymentEntity {
            id: Uuid::new_v4(),
            goal_id: payment.goal_id,
            provider: payment.provider,
            stripe_charge_id: payment.stripe_charge_id,
            amount_minor: payment.amount_minor,
            currency: payment.currency,
            status: payment.status,
            type_: payment.type_,
            recipient_id: payment.recipient_id,
            created_at: now,
            updated_at: now,
        };

        let mut tables = self.tables.lock().unwrap();
        tables.goals.insert(goal.id, goal.clone());
        tables.payments.insert(payment.id, payment.clone());
        Ok((goal, payment))
    }

    async fn find_by_id(&self, goal_id: Uuid) -> Result<Option<GoalEntity>> {
        Ok(self.tables.lock().unwrap().goals.get(&goal_id).cloned())
    }

    async fn find_with_owner(&self, goal_id: Uuid) -> Result<Option<(GoalEntity, UserEntity)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables.goals.get(&goal_id).and_then(|goal| {
            tables
                .users
                .get(&goal.user_id)
                .map(|owner| (goal.clone(), owner.clone()))
        }))
    }

    async fn list_by_owner(&self, user_id: Uuid) -> Result<Vec<GoalEntity>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .goals
            .values()
            .filter(|goal| goal.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_pending_assignment(
        &self,
        excluding_user_id: Uuid,
    ) -> Result<Vec<(GoalEntity, UserEntity)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .goals
            .values()
            .filter(|goal| {
                goal.status == GoalStatus::PendingInstructorAssignment.to_string()
                    && goal.user_id != excluding_user_id
            })
            .filter_map(|goal| {
                tables
                    .users
                    .get(&goal.user_id)
                    .map(|owner| (goal.clone(), owner.clone()))
            })
            .collect())
    }

    async fn list_assigned_to(&self, instructor_id: Uuid) -> Result<Vec<(GoalEntity, UserEntity)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .goals
            .values()
            .filter(|goal| goal.instructor_id == Some(instructor_id))
            .filter_map(|goal| {
                tables
                    .users
                    .get(&goal.user_id)
                    .map(|owner| (goal.clone(), owner.clone()))
            })
            .collect())
    }

    async fn assign_instructor(
        &self,
        goal_id: Uuid,
        instructor_id: Uuid,
    ) -> Result<Option<GoalEntity>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(goal) = tables.goals.get_mut(&goal_id) else {
            return Ok(None);
        };
        if goal.status != GoalStatus::PendingInstructorAssignment.to_string()
            || goal.user_id == instructor_id
        {
            return Ok(None);
        }
        goal.instructor_id = Some(instructor_id);
        goal.status = GoalStatus::Assigned.to_string();
        Ok(Some(goal.clone()))
    }

    async fn start(
        &self,
        goal_id: Uuid,
        owner_id: Uuid,
        started_at: DateTime<Utc>,
        end_date: DateTime<Utc>,
        utc_offset_minutes: i32,
    ) -> Result<Option<GoalEntity>> {
        let mut tables = self.tables.lock().unwrap();
        let Some(goal) = tables.goals.get_mut(&goal_id) else {
            return Ok(None);
        };
        if goal.user_id != owner_id || goal.status != GoalStatus::Assigned.to_string() {
            return Ok(None);
        }
        goal.status = GoalStatus::Active.to_string();
        goal.started_at = Some(started_at);
        goal.end_date = Some(end_date);
        goal.utc_offset_minutes = utc_offset_minutes;
        Ok(Some(goal.clone()))
    }

    async fn settle(
        &self,
        goal_id: Uuid,
        goal_status: String,
        payment_status: String,
    ) -> Result<Option<GoalEntity>> {
        let mut tables = self.tables.lock().unwrap();
        let goal_active = tables
            .goals
            .get(&goal_id)
            .is_some_and(|goal| goal.status == GoalStatus::Active.to_string());
        let payment_id = tables
            .payments
            .values()
            .find(|payment| {
                payment.goal_id == goal_id && payment.status == PaymentStatus::Held.to_string()
            })
            .map(|payment| payment.id);

        let (true, Some(payment_id)) = (goal_active, payment_id) else {
            return Ok(None);
        };

        if let Some(payment) = tables.payments.get_mut(&payment_id) {
            payment.status = payment_status;
        }
        let goal = tables.goals.get_mut(&goal_id).map(|goal| {
            goal.status = goal_status;
            goal.clone()
        });
        Ok(goal)
    }

    async fn list_all(&self) -> Result<Vec<(GoalEntity, Option<PaymentEntity>)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .goals
            .values()
            .map(|goal| {
                let payment = tables
                    .payments
                    .values()
                    .find(|payment| payment.goal_id == goal.id)
                    .cloned();
                (goal.clone(), payment)
            })
            .collect())
    }

    async fn admin_update(
        &self,
        _goal_id: Uuid,
        _changes: AdminUpdateGoalEntity,
    ) -> Result<Option<GoalEntity>> {
        anyhow::bail!("admin updates are not exercised here")
    }

    async fn delete(&self, goal_id: Uuid) -> Result<bool> {
        Ok(self.tables.lock().unwrap().goals.remove(&goal_id).is_some())
    }

    async fn count_involving_user(&self, user_id: Uuid) -> Result<i64> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .goals
            .values()
            .filter(|goal| goal.user_id == user_id || goal.instructor_id == Some(user_id))
            .count() as i64)
    }
}

#[async_trait]
impl DailySubmissionRepository for InMemoryDb {
    async fn upsert_for_day(
        &self,
        submission: InsertDailySubmissionEntity,
    ) -> Result<SubmissionUpsert> {
        let mut tables = self.tables.lock().unwrap();
        let existing_id = tables
            .submissions
            .values()
            .find(|row| {
                row.goal_id == submission.goal_id
                    && row.submission_day == submission.submission_day
            })
            .map(|row| row.id);

        match existing_id.and_then(|id| tables.submissions.get_mut(&id)) {
            Some(row) if row.status != SubmissionStatus::Pending.to_string() => {
                Ok(SubmissionUpsert::AlreadyReviewed(row.clone()))
            }
            Some(row) => {
                row.content = submission.content;
                if submission.file_url.is_some() {
                    row.file_url = submission.file_url;
                }
                row.submission_date = submission.submission_date;
                row.updated_at = submission.submission_date;
                Ok(SubmissionUpsert::Updated(row.clone()))
            }
            None => {
                let row = DailySubmissionEntity {
                    id: Uuid::new_v4(),
                    goal_id: submission.goal_id,
                    submission_date: submission.submission_date,
                    submission_day: submission.submission_day,
                    content: submission.content,
                    file_url: submission.file_url,
                    status: submission.status,
                    reviewer_id: None,
                    reviewer_comment: None,
                    created_at: submission.submission_date,
                    updated_at: submission.submission_date,
                };
                tables.submissions.insert(row.id, row.clone());
                Ok(SubmissionUpsert::Created(row))
            }
        }
    }

    async fn find_by_id(&self, submission_id: Uuid) -> Result<Option<DailySubmissionEntity>> {
        Ok(self
            .tables
            .lock()
            .unwrap()
            .submissions
            .get(&submission_id)
            .cloned())
    }

    async fn update_pending_content(
        &self,
        submission_id: Uuid,
        content: String,
        file_url: Option<String>,
        updated_at: DateTime<Utc>,
    ) -> Result<Option<DailySubmissionEntity>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .submissions
            .get_mut(&submission_id)
            .filter(|row| row.status == SubmissionStatus::Pending.to_string())
            .map(|row| {
                row.content = content;
                row.file_url = file_url;
                row.updated_at = updated_at;
                row.clone()
            }))
    }

    async fn list_by_goal(
        &self,
        goal_id: Uuid,
        order: SortOrder,
    ) -> Result<Vec<DailySubmissionEntity>> {
        let tables = self.tables.lock().unwrap();
        let mut rows = tables
            .submissions
            .values()
            .filter(|row| row.goal_id == goal_id)
            .cloned()
            .collect::<Vec<_>>();
        rows.sort_by_key(|row| row.submission_date);
        if order == SortOrder::Desc {
            rows.reverse();
        }
        Ok(rows)
    }

    async fn list_by_goals(&self, goal_ids: Vec<Uuid>) -> Result<Vec<DailySubmissionEntity>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .submissions
            .values()
            .filter(|row| goal_ids.contains(&row.goal_id))
            .cloned()
            .collect())
    }

    async fn latest_submission_day(&self, goal_id: Uuid) -> Result<Option<NaiveDate>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .submissions
            .values()
            .filter(|row| row.goal_id == goal_id)
            .map(|row| row.submission_day)
            .max())
    }

    async fn list_pending_for_instructor(
        &self,
        instructor_id: Uuid,
    ) -> Result<Vec<(DailySubmissionEntity, GoalEntity, UserEntity)>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .submissions
            .values()
            .filter(|row| row.status == SubmissionStatus::Pending.to_string())
            .filter_map(|row| {
                let goal = tables
                    .goals
                    .get(&row.goal_id)
                    .filter(|goal| goal.instructor_id == Some(instructor_id))?;
                let owner = tables.users.get(&goal.user_id)?;
                Some((row.clone(), goal.clone(), owner.clone()))
            })
            .collect())
    }

    async fn review(
        &self,
        submission_id: Uuid,
        review: ReviewDailySubmissionEntity,
    ) -> Result<Option<DailySubmissionEntity>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables
            .submissions
            .get_mut(&submission_id)
            .filter(|row| row.status == SubmissionStatus::Pending.to_string())
            .map(|row| {
                row.status = review.status;
                row.reviewer_id = review.reviewer_id;
                row.reviewer_comment = review.reviewer_comment;
                row.updated_at = review.updated_at;
                row.clone()
            }))
    }
}

#[async_trait]
impl PaymentRepository for InMemoryDb {
    async fn find_by_goal_id(&self, goal_id: Uuid) -> Result<Option<PaymentEntity>> {
        let tables = self.tables.lock().unwrap();
        Ok(tables
            .payments
            .values()
            .find(|payment| payment.goal_id == goal_id)
            .cloned())
    }
}

#[async_trait]
impl UserRepository for InMemoryDb {
    async fn ensure_exists(&self, user: InsertUserEntity) -> Result<()> {
        let now = Utc::now();
        self.tables
            .lock()
            .unwrap()
            .users
            .entry(user.id)
            .or_insert(UserEntity {
                id: user.id,
                email: user.email,
                name: user.name,
                role: user.role,
                created_at: now,
                updated_at: now,
            });
        Ok(())
    }

    async fn find_by_id(&self, user_id: Uuid) -> Result<Option<UserEntity>> {
        Ok(self.tables.lock().unwrap().users.get(&user_id).cloned())
    }

    async fn list_all(&self) -> Result<Vec<UserEntity>> {
        Ok(self.tables.lock().unwrap().users.values().cloned().collect())
    }

    async fn update(&self, user_id: Uuid, changes: EditUserEntity) -> Result<Option<UserEntity>> {
        let mut tables = self.tables.lock().unwrap();
        Ok(tables.users.get_mut(&user_id).map(|user| {
            if let Some(email) = changes.email {
                user.email = email;
            }
            if let Some(name) = changes.name {
                user.name = name;
            }
            if let Some(updated_at) = changes.updated_at {
                user.updated_at = updated_at;
            }
            if let Some(role) = changes.role {
                user.role = role;
            }
            user.clone()
        }))
    }

    async fn delete(&self, user_id: Uuid) -> Result<bool> {
        Ok(self.tables.lock().unwrap().users.remove(&user_id).is_some())
    }
}

/// Gateway double that remembers every call it accepted.
#[derive(Default)]
struct RecordingGateway {
    calls: Mutex<Vec<String>>,
}

impl RecordingGateway {
    fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for RecordingGateway {
    async fn hold(&self, request: HoldRequest) -> Result<String> {
        let mut calls = self.calls.lock().unwrap();
        calls.push(format!("hold:{}:{}", request.amount_minor, request.idempotency_key));
        Ok(format!("ch_{}", calls.len()))
    }

    async fn refund(&self, charge_id: String, idempotency_key: String) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("refund:{charge_id}:{idempotency_key}"));
        Ok(())
    }

    async fn capture(&self, charge_id: String, idempotency_key: String) -> Result<()> {
        self.calls
            .lock()
            .unwrap()
            .push(format!("capture:{charge_id}:{idempotency_key}"));
        Ok(())
    }
}

struct UrlStorage;

#[async_trait]
impl FileStorage for UrlStorage {
    async fn put(&self, file: UploadedFile) -> Result<String> {
        Ok(format!("https://files.example.com/{}", file.file_name))
    }
}

struct App {
    db: Arc<InMemoryDb>,
    gateway: Arc<RecordingGateway>,
    goals: GoalsUseCase<InMemoryDb, InMemoryDb, InMemoryDb, RecordingGateway>,
    instructor: InstructorUseCase<InMemoryDb, InMemoryDb, InMemoryDb, InMemoryDb, RecordingGateway>,
    submissions: SubmissionsUseCase<InMemoryDb, InMemoryDb, UrlStorage>,
}

impl App {
    fn new() -> Self {
        let db = Arc::new(InMemoryDb::default());
        let gateway = Arc::new(RecordingGateway::default());

        Self {
            goals: GoalsUseCase::new(
                Arc::clone(&db),
                Arc::clone(&db),
                Arc::clone(&db),
                Arc::clone(&gateway),
                "usd".to_string(),
            ),
            instructor: InstructorUseCase::new(
                Arc::clone(&db),
                Arc::clone(&db),
                Arc::clone(&db),
                Arc::clone(&db),
                Arc::clone(&gateway),
            ),
            submissions: SubmissionsUseCase::new(
                Arc::clone(&db),
                Arc::clone(&db),
                Arc::new(UrlStorage),
            ),
            db,
            gateway,
        }
    }

    /// Created, claimed and started: ready for submissions.
    async fn active_goal(&self, student: &RequestContext, instructor: &RequestContext) -> Uuid {
        let created = self
            .goals
            .create(
                student,
                CreateGoalModel {
                    title: Some("Run every day".to_string()),
                    description: Some("At least 3km".to_string()),
                    duration_days: Some(7),
                    stake_amount: Some(Decimal::from(10)),
                    payment_token: Some("tok_visa".to_string()),
                },
            )
            .await
            .unwrap();
        let goal_id = created.goal.id;

        self.instructor
            .accept(
                instructor,
                goal_id,
                AssignGoalModel {
                    action: Some("accept".to_string()),
                },
            )
            .await
            .unwrap();
        self.goals
            .start(student, goal_id, StartGoalModel::default())
            .await
            .unwrap();

        goal_id
    }
}

fn person(role: Role, email: &str) -> RequestContext {
    RequestContext {
        user_id: Uuid::new_v4(),
        email: Some(email.to_string()),
        name: None,
        role,
    }
}

fn finalize(status: &str) -> FinalizeGoalModel {
    FinalizeGoalModel {
        status: Some(status.to_string()),
    }
}

#[tokio::test]
async fn completed_goal_refunds_the_stake() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");
    let instructor = person(Role::Instructor, "coach@example.com");

    let created = app
        .goals
        .create(
            &student,
            CreateGoalModel {
                title: Some("Run every day".to_string()),
                description: Some("At least 3km".to_string()),
                duration_days: Some(7),
                stake_amount: Some(Decimal::from(10)),
                payment_token: Some("tok_visa".to_string()),
            },
        )
        .await
        .unwrap();
    let goal_id = created.goal.id;
    assert_eq!(created.goal.status, GoalStatus::PendingInstructorAssignment);
    assert_eq!(created.payment.status, PaymentStatus::Held);
    assert_eq!(app.gateway.calls(), vec![format!("hold:1000:goal-{goal_id}-hold")]);

    let assigned = app
        .instructor
        .accept(
            &instructor,
            goal_id,
            AssignGoalModel {
                action: Some("accept".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(assigned.status, GoalStatus::Assigned);
    assert_eq!(assigned.instructor_id, Some(instructor.user_id));

    let started = app
        .goals
        .start(&student, goal_id, StartGoalModel::default())
        .await
        .unwrap();
    assert_eq!(started.status, GoalStatus::Active);
    let started_at = started.started_at.unwrap();
    assert_eq!(started.end_date, Some(started_at + Duration::days(7)));

    let submitted = app
        .submissions
        .submit(
            &student,
            SubmitDailyModel {
                goal_id,
                content: "Ran 3.2km".to_string(),
                file: None,
                utc_offset_minutes: 0,
            },
        )
        .await
        .unwrap();
    assert!(submitted.created);

    let reviewed = app
        .instructor
        .review(
            &instructor,
            submitted.submission.id,
            ReviewSubmissionModel {
                status: Some("APPROVED".to_string()),
                reviewer_comment: Some("ignored on approval".to_string()),
            },
        )
        .await
        .unwrap();
    assert_eq!(reviewed.status, SubmissionStatus::Approved);
    assert_eq!(reviewed.reviewer_id, Some(instructor.user_id));
    assert_eq!(reviewed.reviewer_comment, None);

    let finished = app
        .instructor
        .finalize(&instructor, goal_id, finalize("COMPLETED"))
        .await
        .unwrap();
    assert_eq!(finished.status, GoalStatus::Completed);
    assert_eq!(app.db.payment_for(goal_id).status, "REFUNDED");
    assert_eq!(
        app.gateway.calls().last().cloned(),
        Some(format!("refund:ch_1:goal-{goal_id}-refund"))
    );
}

#[tokio::test]
async fn failed_goal_captures_once() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");
    let instructor = person(Role::Instructor, "coach@example.com");
    let goal_id = app.active_goal(&student, &instructor).await;

    let failed = app
        .instructor
        .finalize(&instructor, goal_id, finalize("FAILED"))
        .await
        .unwrap();
    assert_eq!(failed.status, GoalStatus::Failed);
    assert_eq!(app.db.payment_for(goal_id).status, "CAPTURED");

    let err = app
        .instructor
        .finalize(&instructor, goal_id, finalize("FAILED"))
        .await
        .unwrap_err();
    assert!(matches!(err, UseCaseError::InvalidState(_)));

    let captures = app
        .gateway
        .calls()
        .into_iter()
        .filter(|call| call.starts_with("capture:"))
        .count();
    assert_eq!(captures, 1);
}

#[tokio::test]
async fn only_the_assigned_instructor_can_finalize() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");
    let instructor = person(Role::Instructor, "coach@example.com");
    let stranger = person(Role::Instructor, "other@example.com");
    let goal_id = app.active_goal(&student, &instructor).await;
    let calls_before = app.gateway.calls().len();

    let err = app
        .instructor
        .finalize(&stranger, goal_id, finalize("COMPLETED"))
        .await
        .unwrap_err();
    assert!(matches!(err, UseCaseError::Forbidden(_)));

    assert_eq!(app.db.goal(goal_id).status, "ACTIVE");
    assert_eq!(app.db.payment_for(goal_id).status, "HELD");
    assert_eq!(app.gateway.calls().len(), calls_before);
}

#[tokio::test]
async fn owner_cannot_claim_own_goal() {
    let app = App::new();
    let owner = person(Role::Instructor, "both@example.com");

    let created = app
        .goals
        .create(
            &owner,
            CreateGoalModel {
                title: Some("Write".to_string()),
                description: Some("500 words".to_string()),
                duration_days: Some(3),
                stake_amount: Some(Decimal::from(5)),
                payment_token: Some("tok_visa".to_string()),
            },
        )
        .await
        .unwrap();

    let err = app
        .instructor
        .accept(
            &owner,
            created.goal.id,
            AssignGoalModel {
                action: Some("accept".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UseCaseError::SelfAssignment));
    assert_eq!(app.db.goal(created.goal.id).instructor_id, None);
}

#[tokio::test]
async fn oversized_duration_is_rejected_before_any_hold() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");

    let err = app
        .goals
        .create(
            &student,
            CreateGoalModel {
                title: Some("Forever".to_string()),
                description: Some("Every day".to_string()),
                duration_days: Some(200_000_000),
                stake_amount: Some(Decimal::from(10)),
                payment_token: Some("tok_visa".to_string()),
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UseCaseError::Validation(_)));
    assert!(app.gateway.calls().is_empty());
}

#[tokio::test]
async fn fractional_stake_is_held_in_cents() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");

    let created = app
        .goals
        .create(
            &student,
            CreateGoalModel {
                title: Some("Stretch".to_string()),
                description: Some("Ten minutes".to_string()),
                duration_days: Some(2),
                stake_amount: Some(Decimal::new(550, 2)),
                payment_token: Some("tok_visa".to_string()),
            },
        )
        .await
        .unwrap();
    let goal_id = created.goal.id;
    assert_eq!(created.payment.amount, 550);
    assert_eq!(app.gateway.calls(), vec![format!("hold:550:goal-{goal_id}-hold")]);
}

#[tokio::test]
async fn start_before_assignment_is_rejected() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");

    let created = app
        .goals
        .create(
            &student,
            CreateGoalModel {
                title: Some("Read".to_string()),
                description: Some("A chapter".to_string()),
                duration_days: Some(5),
                stake_amount: Some(Decimal::from(7)),
                payment_token: Some("tok_visa".to_string()),
            },
        )
        .await
        .unwrap();

    let err = app
        .goals
        .start(&student, created.goal.id, StartGoalModel::default())
        .await
        .unwrap_err();
    assert!(matches!(err, UseCaseError::InvalidState(_)));
}

#[tokio::test]
async fn same_day_submissions_share_one_row() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");
    let instructor = person(Role::Instructor, "coach@example.com");
    let goal_id = app.active_goal(&student, &instructor).await;

    let first = app
        .submissions
        .submit(
            &student,
            SubmitDailyModel {
                goal_id,
                content: "Morning run".to_string(),
                file: Some(UploadedFile {
                    file_name: "route.png".to_string(),
                    content_type: "image/png".to_string(),
                    bytes: vec![0x89, 0x50],
                }),
                utc_offset_minutes: 0,
            },
        )
        .await
        .unwrap();
    let second = app
        .submissions
        .submit(
            &student,
            SubmitDailyModel {
                goal_id,
                content: "Morning run, plus stretching".to_string(),
                file: None,
                utc_offset_minutes: 0,
            },
        )
        .await
        .unwrap();

    assert!(first.created);
    assert!(!second.created);
    assert_eq!(first.submission.id, second.submission.id);
    assert_eq!(second.submission.content, "Morning run, plus stretching");
    assert_eq!(
        second.submission.file_url.as_deref(),
        Some("https://files.example.com/route.png")
    );

    let detail = app.goals.get(&student, goal_id).await.unwrap();
    assert_eq!(detail.submissions.len(), 1);
    let today = second.submission.submission_day;
    let expected = match today.succ_opt() {
        Some(next) if Some(next) <= detail.goal.end_date.map(|end| end.date_naive()) => {
            NextDue::Due { date: next }
        }
        _ => NextDue::Ended,
    };
    assert_eq!(detail.next_due_date, expected);
}

#[tokio::test]
async fn reviewed_day_cannot_be_resubmitted() {
    let app = App::new();
    let student = person(Role::Student, "student@example.com");
    let instructor = person(Role::Instructor, "coach@example.com");
    let goal_id = app.active_goal(&student, &instructor).await;

    let submitted = app
        .submissions
        .submit(
            &student,
            SubmitDailyModel {
                goal_id,
                content: "Skipped".to_string(),
                file: None,
                utc_offset_minutes: 0,
            },
        )
        .await
        .unwrap();

    let err = app
        .instructor
        .review(
            &instructor,
            submitted.submission.id,
            ReviewSubmissionModel {
                status: Some("REJECTED".to_string()),
                reviewer_comment: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UseCaseError::Validation(_)));

    app.instructor
        .review(
            &instructor,
            submitted.submission.id,
            ReviewSubmissionModel {
                status: Some("REJECTED".to_string()),
                reviewer_comment: Some("No evidence attached".to_string()),
            },
        )
        .await
        .unwrap();

    let err = app
        .submissions
        .submit(
            &student,
            SubmitDailyModel {
                goal_id,
                content: "Here is the evidence".to_string(),
                file: None,
                utc_offset_minutes: 0,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, UseCaseError::InvalidState(_)));
}
