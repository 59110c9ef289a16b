//! Publish phase: push the site to a new GitHub repository.

use serde::Serialize;

use super::PromptContext;
use crate::config::GithubSettings;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishPayload {
    pub project_path: String,
    pub repo_name: String,
    pub business_data: PublishBusiness,
    pub github_config: GithubSettings,
}

#[derive(Debug, Serialize)]
pub struct PublishBusiness {
    pub name: String,
    pub city: String,
    pub sector: String,
}

impl PublishPayload {
    pub fn new(ctx: &PromptContext<'_>, github: &GithubSettings) -> Self {
        Self {
            project_path: ctx.site_dir.display().to_string(),
            repo_name: ctx.site_slug.to_string(),
            business_data: PublishBusiness {
                name: ctx.business.name.clone(),
                city: ctx.business.city.clone(),
                sector: ctx.business.primary_service().to_string(),
            },
            github_config: github.clone(),
        }
    }
}

pub fn prompt(ctx: &PromptContext<'_>, github: &GithubSettings) -> String {
    let payload = PublishPayload::new(ctx, github);
    let payload = serde_json::to_string_pretty(&payload).unwrap_or_default();
    format!(
        r#"You are the GitHub publisher. Publish this project to GitHub with the following configuration:

{payload}

Steps:
1. Initialise a git repository in projectPath if there is none, with a sensible .gitignore.
2. Configure the commit author from githubConfig when username and email are set.
3. Commit all files with a descriptive message.
4. Create the repository repoName with the `gh` CLI (authenticated through GH_TOKEN) using
   the requested visibility, add it as origin, and push the main branch.
5. Add a short description and topics derived from businessData.

When done, answer ONLY with a JSON object:
{{
  "success": true,
  "github_url": "https://github.com/<owner>/<repo>",
  "message": "Repository created and code pushed"
}}

If something fails, answer:
{{
  "success": false,
  "error": "<what went wrong>",
  "message": "GitHub publication failed"
}}"#
    )
}
