mod create;
mod delete;
mod find_app;
mod resync;
mod status;
mod update;

pub(crate) use create::create_argo_resources;
pub(crate) use delete::{delete_app_and_project, terminate_argo_app_operation, DeleteRequest};
pub(crate) use find_app::find_argo_app;
pub(crate) use resync::{resync_app_on_all_argos, sync_argo_app};
pub(crate) use status::{get_argo_application_info, get_argo_project, get_revision_data, list_instances};
pub(crate) use update::update_argo_project_and_app;
