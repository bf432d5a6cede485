//! Message handler
//!
//! One inbound chat message in, at most one rendered reply out. Commands are
//! checked against the authorization policy; anything that is not a command
//! the sender may run is treated as a question.

use crate::auth::AuthorizationPolicy;
use crate::command::{self, Command, CommandKind, ParseOutcome};
use crate::render;
use qa_common::config::DisplayConfig;
use qa_common::{Answer, QaEngine, QaError};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

pub const DISABLED_REPLY: &str = "知识库功能已关闭";

/// An inbound chat message
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Group id, used as the knowledge base namespace
    pub namespace: String,
    pub user_id: String,
    /// Sender role in the group (owner, admin, member)
    #[serde(default = "default_role")]
    pub role: String,
    #[serde(default)]
    pub message_id: String,
    pub text: String,
}

fn default_role() -> String {
    "member".to_string()
}

pub struct Bot<P: AuthorizationPolicy> {
    engine: Arc<QaEngine>,
    policy: P,
    display: DisplayConfig,
}

impl<P: AuthorizationPolicy> Bot<P> {
    pub fn new(engine: Arc<QaEngine>, policy: P) -> Self {
        let display = engine.config().display.clone();
        Self {
            engine,
            policy,
            display,
        }
    }

    pub fn engine(&self) -> &Arc<QaEngine> {
        &self.engine
    }

    /// Handle one message; None means stay silent
    pub async fn handle(&self, msg: &Message) -> qa_common::Result<Option<String>> {
        let body = match command::parse(&msg.text) {
            ParseOutcome::Command(cmd) if self.may_run(cmd.kind, msg) => {
                self.run(&cmd, msg).await?
            }
            ParseOutcome::Usage(spec) if self.may_run(spec.kind, msg) => {
                Some(render::render_usage(spec))
            }
            _ => self.answer(msg).await?,
        };

        Ok(body.map(|body| render::reply(&msg.message_id, &body)))
    }

    fn may_run(&self, kind: CommandKind, msg: &Message) -> bool {
        match kind {
            CommandKind::On | CommandKind::Off => self.policy.is_root(&msg.user_id),
            CommandKind::Add | CommandKind::Delete => {
                self.policy.is_authorized(&msg.role, &msg.user_id)
            }
            CommandKind::List | CommandKind::Compare | CommandKind::Help => true,
        }
    }

    async fn answer(&self, msg: &Message) -> qa_common::Result<Option<String>> {
        match self.engine.ask(&msg.namespace, &msg.text).await {
            Ok(Answer::Disabled) => Ok(Some(DISABLED_REPLY.to_string())),
            Ok(answer) => Ok(render::render_answer(&answer, self.display.show_confidence)),
            Err(e) if e.is_fatal() => Err(e),
            Err(QaError::Timeout(deadline)) => {
                warn!("{}: match timed out after {:?}", msg.namespace, deadline);
                Ok(None)
            }
            Err(e) => {
                error!("{}: match failed: {}", msg.namespace, e);
                Ok(None)
            }
        }
    }

    async fn run(&self, cmd: &Command, msg: &Message) -> qa_common::Result<Option<String>> {
        let ns = msg.namespace.as_str();
        debug!("{}: {:?} from {}", ns, cmd.kind, msg.user_id);

        let result = match cmd.kind {
            CommandKind::Add => {
                let (question, answer) = (&cmd.args[0], &cmd.args[1]);
                self.engine
                    .upsert(ns, question, answer)
                    .await
                    .map(|outcome| {
                        info!("{}: {} {:?} by {}", ns, outcome.as_str(), question, msg.user_id);
                        render::render_upsert(outcome, question, answer)
                    })
            }
            CommandKind::Delete => {
                let question = &cmd.args[0];
                self.engine
                    .delete(ns, question)
                    .await
                    .map(|removed| render::render_delete(removed, question))
            }
            CommandKind::List => {
                let page = match cmd.args.first() {
                    None => 1,
                    Some(arg) => match arg.parse::<usize>() {
                        Ok(page) => page,
                        Err(_) => return Ok(Some(self.usage(cmd.kind))),
                    },
                };
                self.engine
                    .list(ns)
                    .await
                    .map(|entries| render::render_list(&entries, page, self.display.page_size))
            }
            CommandKind::Compare => {
                let (a, b) = (&cmd.args[0], &cmd.args[1]);
                Ok(render::render_compare(a, b, self.engine.compare(a, b)))
            }
            CommandKind::On => self
                .engine
                .set_enabled(ns, true)
                .map(|()| "知识库已开启".to_string()),
            CommandKind::Off => self
                .engine
                .set_enabled(ns, false)
                .map(|()| "知识库已关闭".to_string()),
            CommandKind::Help => Ok(render::render_help()),
        };

        match result {
            Ok(body) => Ok(Some(body)),
            Err(e) => self.recover(cmd.kind, ns, e),
        }
    }

    fn usage(&self, kind: CommandKind) -> String {
        command::spec_for(kind)
            .map(render::render_usage)
            .unwrap_or_default()
    }

    /// Turn a failed command into a reply; fatal errors are propagated
    fn recover(
        &self,
        kind: CommandKind,
        ns: &str,
        err: QaError,
    ) -> qa_common::Result<Option<String>> {
        match err {
            QaError::Disabled(_) => Ok(Some(DISABLED_REPLY.to_string())),
            QaError::InvalidInput(reason) => Ok(Some(format!("输入无效: {}", reason))),
            e if e.is_fatal() => Err(e),
            e => {
                error!("{}: {:?} failed: {}", ns, kind, e);
                Ok(Some("操作失败，请稍后重试".to_string()))
            }
        }
    }
}
