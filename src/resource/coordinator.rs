use super::kind::ResourceKind;
use super::permission::{row_actions, RowActions};
use super::pipeline::{self, ListPage, TabFilter, ViewState};
use super::record::Record;
use crate::config::LoadFailurePolicy;
use crate::error::{ConsoleError, ConsoleResult};
use crate::session::dto::SessionIdentity;
use log::{info, warn};
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub kind: ResourceKind,
    pub generation: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MutationTicket {
    pub kind: ResourceKind,
    pub id: i64,
    pub epoch: u64,
}

/// 一次加载的三路结果汇总
#[derive(Debug, Clone)]
pub struct LoadOutcome {
    pub session: Option<SessionIdentity>,
    pub records: ConsoleResult<Vec<Record>>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    LoadFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadApplied {
    Applied { count: usize },
    Failed(ConsoleError),
    /// 已有更新的加载发出，本次结果被丢弃
    Stale { generation: u64, latest: u64 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum MutationApplied {
    Removed,
    /// 记录已不在当前集合中（例如被并发的刷新替换掉），视为成功
    AlreadyAbsent,
    Failed(ConsoleError),
    /// 页面已离开，结果不再应用
    Abandoned,
}

/// 单个列表页面的权威数据与视图状态
pub struct ListCoordinator {
    kind: ResourceKind,
    page_size: usize,
    failure_policy: LoadFailurePolicy,
    records: Vec<Record>,
    session: Option<SessionIdentity>,
    view: ViewState,
    selection: BTreeSet<i64>,
    in_flight: HashSet<i64>,
    state: LoadState,
    /// 最近一次落定的状态，离开页面时回退到它
    settled: LoadState,
    latest_generation: u64,
    epoch: u64,
}

impl ListCoordinator {
    pub fn new(kind: ResourceKind, page_size: usize, failure_policy: LoadFailurePolicy) -> Self {
        Self {
            kind,
            page_size: page_size.max(1),
            failure_policy,
            records: Vec::new(),
            session: None,
            view: ViewState::default(),
            selection: BTreeSet::new(),
            in_flight: HashSet::new(),
            state: LoadState::Idle,
            settled: LoadState::Idle,
            latest_generation: 0,
            epoch: 0,
        }
    }

    pub fn kind(&self) -> ResourceKind {
        self.kind
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn session(&self) -> Option<&SessionIdentity> {
        self.session.as_ref()
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn record(&self, id: i64) -> Option<&Record> {
        self.records.iter().find(|r| r.id == id)
    }

    pub fn actions(&self, record: &Record) -> RowActions {
        row_actions(self.kind, self.session.as_ref(), record)
    }

    // ---------- 加载 ----------

    /// 发出新的加载，返回带代号的票据
    pub fn begin_load(&mut self) -> LoadTicket {
        self.latest_generation += 1;
        self.state = LoadState::Loading;
        LoadTicket {
            kind: self.kind,
            generation: self.latest_generation,
        }
    }

    /// 只有最新代号的结果才会写入状态
    pub fn apply_load(&mut self, ticket: LoadTicket, outcome: LoadOutcome) -> LoadApplied {
        if ticket.generation != self.latest_generation {
            warn!(
                "{} discard load generation {} (latest {})",
                self.kind, ticket.generation, self.latest_generation
            );
            return LoadApplied::Stale {
                generation: ticket.generation,
                latest: self.latest_generation,
            };
        }

        self.session = outcome.session;
        match outcome.records {
            Ok(records) => {
                let count = records.len();
                self.records = records;
                self.view.page = 1;
                self.selection.clear();
                self.state = LoadState::Loaded;
                self.settled = LoadState::Loaded;
                info!(
                    "{} load generation {} applied: {} records",
                    self.kind, ticket.generation, count
                );
                LoadApplied::Applied { count }
            }
            Err(e) => {
                if self.failure_policy == LoadFailurePolicy::Clear {
                    self.records.clear();
                    self.selection.clear();
                    self.view.page = 1;
                }
                self.state = LoadState::LoadFailed(e.to_string());
                self.settled = self.state.clone();
                warn!("{} load generation {} failed: {}", self.kind, ticket.generation, e);
                LoadApplied::Failed(e)
            }
        }
    }

    /// 离开页面：所有在途的加载与变更结果到达时都会被丢弃
    pub fn abandon(&mut self) {
        self.epoch += 1;
        self.latest_generation += 1;
        self.in_flight.clear();
        if self.state == LoadState::Loading {
            self.state = self.settled.clone();
        }
    }

    // ---------- 变更 ----------

    pub fn begin_delete(&mut self, id: i64) -> ConsoleResult<MutationTicket> {
        let record = self
            .record(id)
            .ok_or_else(|| ConsoleError::NotAllowed(format!("记录 #{} 不存在", id)))?;
        if !self.actions(record).can_delete {
            return Err(ConsoleError::PermissionDenied(
                "仅创建者或管理员可删除".to_string(),
            ));
        }
        if !self.in_flight.insert(id) {
            return Err(ConsoleError::NotAllowed(format!("记录 #{} 正在删除中", id)));
        }
        Ok(MutationTicket {
            kind: self.kind,
            id,
            epoch: self.epoch,
        })
    }

    pub fn is_mutating(&self, id: i64) -> bool {
        self.in_flight.contains(&id)
    }

    /// 按 id 应用删除结果；id 已不存在时为空操作
    pub fn apply_delete(
        &mut self,
        ticket: MutationTicket,
        result: ConsoleResult<()>,
    ) -> MutationApplied {
        if ticket.epoch != self.epoch {
            info!("{} drop delete #{} from abandoned epoch", self.kind, ticket.id);
            return MutationApplied::Abandoned;
        }
        self.in_flight.remove(&ticket.id);

        match result {
            Ok(()) => {
                let before = self.records.len();
                self.records.retain(|r| r.id != ticket.id);
                self.selection.remove(&ticket.id);
                self.clamp_page();
                if self.records.len() < before {
                    MutationApplied::Removed
                } else {
                    MutationApplied::AlreadyAbsent
                }
            }
            Err(e) => MutationApplied::Failed(e),
        }
    }

    /// 终止需要与删除相同的权限，且仅对未完成的任务可见
    pub fn check_stop(&self, id: i64) -> ConsoleResult<&Record> {
        let record = self
            .record(id)
            .ok_or_else(|| ConsoleError::NotAllowed(format!("记录 #{} 不存在", id)))?;
        let actions = self.actions(record);
        if !actions.stop_visible {
            return Err(ConsoleError::NotAllowed("该记录不可终止".to_string()));
        }
        if !actions.can_stop {
            return Err(ConsoleError::PermissionDenied(
                "仅创建者可终止".to_string(),
            ));
        }
        Ok(record)
    }

    pub fn check_export(&self, id: i64) -> ConsoleResult<&Record> {
        let record = self
            .record(id)
            .ok_or_else(|| ConsoleError::NotAllowed(format!("记录 #{} 不存在", id)))?;
        if !self.actions(record).can_export {
            return Err(ConsoleError::NotAllowed("运行中的任务不能导出".to_string()));
        }
        Ok(record)
    }

    pub fn check_download(&self, id: i64) -> ConsoleResult<&Record> {
        let record = self
            .record(id)
            .ok_or_else(|| ConsoleError::NotAllowed(format!("记录 #{} 不存在", id)))?;
        if !self.actions(record).can_download {
            return Err(ConsoleError::NotAllowed("导出未完成".to_string()));
        }
        Ok(record)
    }

    // ---------- 勾选 ----------

    /// 切换勾选状态，返回切换后是否选中
    pub fn toggle_selection(&mut self, id: i64) -> ConsoleResult<bool> {
        let record = self
            .record(id)
            .ok_or_else(|| ConsoleError::NotAllowed(format!("记录 #{} 不存在", id)))?;
        if !self.actions(record).selectable {
            return Err(ConsoleError::NotAllowed("该记录不能勾选".to_string()));
        }
        if self.selection.remove(&id) {
            Ok(false)
        } else {
            self.selection.insert(id);
            Ok(true)
        }
    }

    pub fn is_selected(&self, id: i64) -> bool {
        self.selection.contains(&id)
    }

    pub fn selected_ids(&self) -> Vec<i64> {
        self.selection.iter().copied().collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection.clear();
    }

    // ---------- 视图 ----------

    pub fn set_tab(&mut self, tab: TabFilter) {
        info!("{} tab -> {}", self.kind, tab.as_str());
        self.view.tab = tab;
        self.view.page = 1;
    }

    pub fn cycle_tab(&mut self) {
        let next = self.kind.next_tab(self.view.tab);
        self.set_tab(next);
    }

    pub fn set_search(&mut self, text: &str) {
        self.view.search = text.to_string();
        self.view.page = 1;
    }

    pub fn set_page(&mut self, page: usize) {
        self.view.page = page;
        self.clamp_page();
    }

    pub fn next_page(&mut self) {
        self.set_page(self.view.page.saturating_add(1));
    }

    pub fn prev_page(&mut self) {
        self.set_page(self.view.page.saturating_sub(1));
    }

    fn clamp_page(&mut self) {
        let total = self.current_page().total_pages;
        self.view.page = pipeline::clamp_page(self.view.page, total);
    }

    pub fn current_page(&self) -> ListPage<'_> {
        pipeline::run(&self.records, self.kind, &self.view, self.page_size)
    }
}
