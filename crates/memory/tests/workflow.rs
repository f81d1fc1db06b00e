//! Provisioning workflow tests against the in-memory cloud backend.

use std::sync::Arc;
use std::time::Duration;

use stateforge_core::config::{Configuration, LockingMechanism, ProvisionRequest};
use stateforge_core::error::{CloudError, ProvisionError};
use stateforge_core::result::{ProvisionAction, ResourceStatus};
use stateforge_core::workflow::{Provisioner, TableWaitConfig};
use stateforge_memory::{MemoryCloud, MemoryConnector};

fn harness() -> (Arc<MemoryCloud>, Provisioner) {
    let cloud = Arc::new(MemoryCloud::new());
    let provisioner = Provisioner::new(Arc::new(MemoryConnector::new(Arc::clone(&cloud))));
    (cloud, provisioner)
}

fn s3_config(bucket: &str) -> Configuration {
    Configuration::validate(ProvisionRequest {
        region: "eu-west-1".to_owned(),
        bucket_name: bucket.to_owned(),
        locking_mechanism: LockingMechanism::S3,
        table_name: None,
        aws_access_key_id: None,
        aws_secret_access_key: None,
    })
    .unwrap()
}

fn dynamodb_config(bucket: &str, table: &str) -> Configuration {
    Configuration::validate(ProvisionRequest {
        region: "eu-west-1".to_owned(),
        bucket_name: bucket.to_owned(),
        locking_mechanism: LockingMechanism::DynamoDb,
        table_name: Some(table.to_owned()),
        aws_access_key_id: None,
        aws_secret_access_key: None,
    })
    .unwrap()
}

#[tokio::test]
async fn create_with_s3_locking_hardens_bucket_and_skips_table() {
    let (cloud, provisioner) = harness();

    let result = provisioner
        .create(&s3_config("my-terraform-bucket"))
        .await
        .unwrap();

    assert_eq!(result.action, ProvisionAction::Create);
    assert_eq!(result.bucket_status, ResourceStatus::Created);
    assert_eq!(result.table_status, Some(ResourceStatus::Skipped));

    let bucket = cloud.bucket("my-terraform-bucket").unwrap();
    assert_eq!(bucket.region, "eu-west-1");
    assert!(bucket.versioning);
    assert!(bucket.encryption);
    assert!(bucket.public_access_block);

    // No table operation of any kind for the s3 mechanism.
    assert_eq!(cloud.calls("table_exists"), 0);
    assert_eq!(cloud.calls("create_table"), 0);
}

#[tokio::test(start_paused = true)]
async fn create_with_dynamodb_locking_waits_for_active_table() {
    let (cloud, provisioner) = harness();
    cloud.set_activation_polls(3);

    let result = provisioner
        .create(&dynamodb_config("my-terraform-bucket", "my-lock"))
        .await
        .unwrap();

    assert_eq!(result.bucket_status, ResourceStatus::Created);
    assert_eq!(result.table_status, Some(ResourceStatus::Created));
    assert!(cloud.has_table("my-lock"));
    // Three "creating" probes plus the final "active" one.
    assert_eq!(cloud.calls("describe_table"), 4);
}

#[tokio::test(start_paused = true)]
async fn create_twice_reports_already_exists_not_an_error() {
    let (cloud, provisioner) = harness();
    let config = dynamodb_config("my-terraform-bucket", "my-lock");

    provisioner.create(&config).await.unwrap();
    let second = provisioner.create(&config).await.unwrap();

    assert_eq!(second.bucket_status, ResourceStatus::AlreadyExists);
    assert_eq!(second.table_status, Some(ResourceStatus::AlreadyExists));
    // The existence probes short-circuit re-creation.
    assert_eq!(cloud.calls("create_bucket"), 1);
    assert_eq!(cloud.calls("create_table"), 1);
}

#[tokio::test]
async fn create_against_bucket_in_other_region_is_a_conflict() {
    let (cloud, provisioner) = harness();
    cloud.seed_bucket("my-terraform-bucket", "us-east-1");

    let failure = provisioner
        .create(&s3_config("my-terraform-bucket"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        ProvisionError::ResourceConflict { .. }
    ));
    assert_eq!(failure.partial.bucket_status, ResourceStatus::Failed);
    assert_eq!(cloud.calls("create_bucket"), 0);
}

#[tokio::test]
async fn hardening_failure_leaves_bucket_in_place_reported_created() {
    let (cloud, provisioner) = harness();
    cloud.fail_op(
        "block_public_access",
        CloudError::AccessDenied("no s3:PutPublicAccessBlock".to_owned()),
    );

    let failure = provisioner
        .create(&s3_config("my-terraform-bucket"))
        .await
        .unwrap_err();

    assert!(matches!(failure.error, ProvisionError::Provider { .. }));
    assert_eq!(failure.partial.bucket_status, ResourceStatus::Created);
    assert_eq!(failure.partial.table_status, None);
    // Bucket is not rolled back.
    assert!(cloud.bucket("my-terraform-bucket").is_some());
}

#[tokio::test]
async fn rerun_after_hardening_failure_converges() {
    let (cloud, provisioner) = harness();
    cloud.fail_op("enable_encryption", CloudError::Throttled);
    let config = s3_config("my-terraform-bucket");

    provisioner.create(&config).await.unwrap_err();
    assert!(!cloud.bucket("my-terraform-bucket").unwrap().encryption);

    let second = provisioner.create(&config).await.unwrap();
    assert_eq!(second.bucket_status, ResourceStatus::AlreadyExists);
    assert!(cloud.bucket("my-terraform-bucket").unwrap().encryption);
}

#[tokio::test(start_paused = true)]
async fn activation_poll_budget_exceeded_times_out() {
    let (cloud, provisioner) = harness();
    cloud.set_activation_polls(100);
    let provisioner = provisioner.with_wait(TableWaitConfig {
        delay: Duration::from_millis(10),
        max_attempts: 5,
    });

    let failure = provisioner
        .create(&dynamodb_config("my-terraform-bucket", "my-lock"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        ProvisionError::ActivationTimeout { attempts: 5, .. }
    ));
    assert_eq!(failure.partial.bucket_status, ResourceStatus::Created);
    assert_eq!(failure.partial.table_status, Some(ResourceStatus::Failed));
    assert_eq!(cloud.calls("describe_table"), 5);
}

#[tokio::test]
async fn delete_empties_versioned_bucket_before_deleting_it() {
    let (cloud, provisioner) = harness();
    cloud.seed_bucket("my-terraform-bucket", "eu-west-1");
    cloud.seed_object("my-terraform-bucket", "env/terraform.tfstate", Some("v1"));
    cloud.seed_object("my-terraform-bucket", "env/terraform.tfstate", Some("v2"));
    cloud.seed_object("my-terraform-bucket", "env/terraform.tfstate", None);
    cloud.seed_table("my-lock");

    let result = provisioner
        .delete(&dynamodb_config("my-terraform-bucket", "my-lock"))
        .await
        .unwrap();

    assert_eq!(result.action, ProvisionAction::Delete);
    assert_eq!(result.bucket_status, ResourceStatus::Deleted);
    assert_eq!(result.table_status, Some(ResourceStatus::Deleted));
    assert!(cloud.bucket("my-terraform-bucket").is_none());
    assert!(!cloud.has_table("my-lock"));
    // The fake rejects delete_bucket on a non-empty bucket, so reaching
    // Deleted proves the versions were drained first.
    assert_eq!(cloud.calls("delete_objects"), 1);
}

#[tokio::test]
async fn delete_twice_reports_not_found_not_an_error() {
    let (cloud, provisioner) = harness();
    cloud.seed_bucket("my-terraform-bucket", "eu-west-1");
    cloud.seed_table("my-lock");
    let config = dynamodb_config("my-terraform-bucket", "my-lock");

    provisioner.delete(&config).await.unwrap();
    let second = provisioner.delete(&config).await.unwrap();

    assert_eq!(second.bucket_status, ResourceStatus::NotFound);
    assert_eq!(second.table_status, Some(ResourceStatus::NotFound));
}

#[tokio::test]
async fn fault_during_emptying_keeps_table_deleted_status() {
    let (cloud, provisioner) = harness();
    cloud.seed_bucket("my-terraform-bucket", "eu-west-1");
    cloud.seed_object("my-terraform-bucket", "terraform.tfstate", Some("v1"));
    cloud.seed_table("my-lock");
    cloud.fail_op("list_object_versions", CloudError::Throttled);

    let failure = provisioner
        .delete(&dynamodb_config("my-terraform-bucket", "my-lock"))
        .await
        .unwrap_err();

    // Table deletion happened first and must be reported as such.
    assert_eq!(failure.partial.table_status, Some(ResourceStatus::Deleted));
    assert_eq!(failure.partial.bucket_status, ResourceStatus::Failed);
    assert!(!cloud.has_table("my-lock"));
    assert!(cloud.bucket("my-terraform-bucket").is_some());
}

#[tokio::test]
async fn undeletable_object_aborts_the_drain_instead_of_looping() {
    let (cloud, provisioner) = harness();
    cloud.seed_bucket("my-terraform-bucket", "eu-west-1");
    cloud.seed_object("my-terraform-bucket", "terraform.tfstate", Some("v1"));
    cloud.seed_locked_object("my-terraform-bucket", "retained.tfstate", Some("v1"));
    cloud.seed_table("my-lock");

    let failure = provisioner
        .delete(&dynamodb_config("my-terraform-bucket", "my-lock"))
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        ProvisionError::Provider {
            operation: "delete_objects",
            ..
        }
    ));
    assert_eq!(failure.partial.table_status, Some(ResourceStatus::Deleted));
    assert_eq!(failure.partial.bucket_status, ResourceStatus::Failed);
    // The per-object failure aborts after one list/delete round; a key
    // that can never go away must not keep the drain re-listing it.
    assert_eq!(cloud.calls("list_object_versions"), 1);
    assert_eq!(cloud.calls("delete_objects"), 1);
    assert_eq!(cloud.calls("delete_bucket"), 0);
}

#[tokio::test]
async fn table_delete_failure_leaves_bucket_untouched() {
    let (cloud, provisioner) = harness();
    cloud.seed_bucket("my-terraform-bucket", "eu-west-1");
    cloud.seed_table("my-lock");
    cloud.fail_op(
        "delete_table",
        CloudError::AccessDenied("no dynamodb:DeleteTable".to_owned()),
    );

    let failure = provisioner
        .delete(&dynamodb_config("my-terraform-bucket", "my-lock"))
        .await
        .unwrap_err();

    assert_eq!(failure.partial.table_status, Some(ResourceStatus::Failed));
    assert_eq!(failure.partial.bucket_status, ResourceStatus::Skipped);
    // No bucket call was issued after the table failure.
    assert_eq!(cloud.calls("bucket_exists"), 0);
    assert!(cloud.bucket("my-terraform-bucket").is_some());
}

#[tokio::test]
async fn delete_with_s3_locking_skips_the_table_step() {
    let (cloud, provisioner) = harness();
    cloud.seed_bucket("my-terraform-bucket", "eu-west-1");

    let result = provisioner
        .delete(&s3_config("my-terraform-bucket"))
        .await
        .unwrap();

    assert_eq!(result.table_status, Some(ResourceStatus::Skipped));
    assert_eq!(cloud.calls("table_exists"), 0);
    assert_eq!(cloud.calls("delete_table"), 0);
}

#[tokio::test]
async fn invalid_configuration_issues_no_remote_calls() {
    let (cloud, _provisioner) = harness();

    let rejected = Configuration::validate(ProvisionRequest {
        region: "eu-west-1".to_owned(),
        bucket_name: "Invalid_Bucket_Name".to_owned(),
        locking_mechanism: LockingMechanism::DynamoDb,
        table_name: Some("my-lock".to_owned()),
        aws_access_key_id: None,
        aws_secret_access_key: None,
    });

    assert!(rejected.is_err());
    assert_eq!(cloud.total_calls(), 0);
}

#[tokio::test]
async fn connect_failure_reports_nothing_touched() {
    let (cloud, provisioner) = harness();
    cloud.fail_op(
        "connect",
        CloudError::Credentials("no credential source found".to_owned()),
    );

    let failure = provisioner
        .create(&s3_config("my-terraform-bucket"))
        .await
        .unwrap_err();

    assert!(matches!(failure.error, ProvisionError::Connect { .. }));
    assert_eq!(failure.partial.bucket_status, ResourceStatus::Skipped);
    assert_eq!(cloud.total_calls(), 0);
}
