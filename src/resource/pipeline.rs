use super::format::timestamp_millis;
use super::kind::ResourceKind;
use super::record::Record;
use super::status::CanonicalStatus;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TabFilter {
    #[default]
    All,
    Status(CanonicalStatus),
}

impl TabFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TabFilter::All => "all",
            TabFilter::Status(s) => s.as_str(),
        }
    }
}

impl std::str::FromStr for TabFilter {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim();
        if t.eq_ignore_ascii_case("all") || t == "全部" {
            return Ok(TabFilter::All);
        }
        t.parse::<CanonicalStatus>().map(TabFilter::Status)
    }
}

/// 由展示层持有、作为纯输入交给流水线
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewState {
    pub tab: TabFilter,
    pub search: String,
    pub page: usize,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            tab: TabFilter::All,
            search: String::new(),
            page: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListPage<'a> {
    pub items: Vec<&'a Record>,
    pub total_count: usize,
    pub total_pages: usize,
    /// 钳制后的实际页码
    pub page: usize,
}

pub fn total_pages(filtered_count: usize, page_size: usize) -> usize {
    let size = page_size.max(1);
    filtered_count.div_ceil(size).max(1)
}

pub fn clamp_page(page: usize, total_pages: usize) -> usize {
    page.clamp(1, total_pages.max(1))
}

/// 时间倒序，时间相同时 id 倒序；无法解析的时间按 0 处理
pub fn sort_records(records: &[Record]) -> Vec<&Record> {
    let mut keyed: Vec<(i64, &Record)> = records
        .iter()
        .map(|r| (timestamp_millis(r.timestamp.as_deref()), r))
        .collect();
    keyed.sort_by(|(ta, a), (tb, b)| match tb.cmp(ta) {
        Ordering::Equal => b.id.cmp(&a.id),
        other => other,
    });
    keyed.into_iter().map(|(_, r)| r).collect()
}

fn matches_search(record: &Record, needle: &str) -> bool {
    record.name.contains(needle)
        || record
            .owner_name
            .as_deref()
            .map(|n| n.contains(needle))
            .unwrap_or(false)
        || record
            .owner_id
            .map(|id| id.to_string().contains(needle))
            .unwrap_or(false)
        || record
            .metric
            .count
            .map(|c| c.to_string().contains(needle))
            .unwrap_or(false)
}

/// 排序 → 标签过滤 → 文本过滤（不分页）
pub fn filter_records<'a>(
    records: &'a [Record],
    kind: ResourceKind,
    tab: TabFilter,
    search: &str,
) -> Vec<&'a Record> {
    let needle = search.trim();
    sort_records(records)
        .into_iter()
        .filter(|r| match tab {
            TabFilter::All => true,
            TabFilter::Status(key) => kind.classify(r).key == key,
        })
        .filter(|r| search.is_empty() || matches_search(r, needle))
        .collect()
}

pub fn run<'a>(
    records: &'a [Record],
    kind: ResourceKind,
    view: &ViewState,
    page_size: usize,
) -> ListPage<'a> {
    let size = page_size.max(1);
    let filtered = filter_records(records, kind, view.tab, &view.search);
    let total_count = filtered.len();
    let total_pages = total_pages(total_count, size);
    let page = clamp_page(view.page, total_pages);

    let items = filtered
        .into_iter()
        .skip((page - 1) * size)
        .take(size)
        .collect();

    ListPage {
        items,
        total_count,
        total_pages,
        page,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::record::Metric;

    fn rec(id: i64, ts: Option<&str>, status: &str) -> Record {
        Record {
            id,
            name: format!("任务{}", id),
            raw_status: Some(status.to_string()),
            owner_id: Some(id % 3),
            timestamp: ts.map(str::to_string),
            metric: Metric {
                count: Some(id as u64 * 100),
                ..Default::default()
            },
            owner_name: None,
        }
    }

    fn ids(items: &[&Record]) -> Vec<i64> {
        items.iter().map(|r| r.id).collect()
    }

    #[test]
    fn sort_desc_by_time_then_id() {
        let recs = vec![
            rec(1, Some("2024-01-01 10:00:00"), "运行中"),
            rec(2, Some("2024-01-02 10:00:00"), "运行中"),
            rec(3, Some("2024-01-01 10:00:00"), "运行中"),
            rec(4, Some("bogus"), "运行中"),
            rec(5, None, "运行中"),
        ];
        let sorted = sort_records(&recs);
        assert_eq!(ids(&sorted), vec![2, 3, 1, 5, 4]);
    }

    #[test]
    fn all_tab_and_empty_search_keep_everything() {
        let recs: Vec<Record> = (1..=7)
            .map(|i| rec(i, Some("2024-01-01 00:00:00"), "已完成"))
            .collect();
        let out = filter_records(&recs, ResourceKind::Tasks, TabFilter::All, "");
        assert_eq!(out.len(), recs.len());
    }

    #[test]
    fn tab_filter_uses_canonical_key() {
        let recs = vec![
            rec(1, None, "运行中"),
            rec(2, None, "已完成"),
            rec(3, None, "已暂停"),
            rec(4, None, "失败"),
        ];
        let out = filter_records(
            &recs,
            ResourceKind::Tasks,
            TabFilter::Status(CanonicalStatus::Stopped),
            "",
        );
        assert_eq!(ids(&out), vec![3]);
    }

    #[test]
    fn search_matches_any_field_after_trim() {
        let mut recs = vec![rec(1, None, "运行中"), rec(2, None, "运行中"), rec(5, None, "运行中")];
        recs[1].owner_name = Some("李四".to_string());
        let by_name = filter_records(&recs, ResourceKind::Tasks, TabFilter::All, " 任务5 ");
        assert_eq!(ids(&by_name), vec![5]);
        let by_owner = filter_records(&recs, ResourceKind::Tasks, TabFilter::All, "李");
        assert_eq!(ids(&by_owner), vec![2]);
        // owner_id: 5 % 3 == 2
        let by_owner_id = filter_records(&recs, ResourceKind::Tasks, TabFilter::All, "2");
        assert!(by_owner_id.iter().any(|r| r.id == 5));
        let by_count = filter_records(&recs, ResourceKind::Tasks, TabFilter::All, "500");
        assert_eq!(ids(&by_count), vec![5]);
        let none = filter_records(&recs, ResourceKind::Tasks, TabFilter::All, "zzz");
        assert!(none.is_empty());
    }

    #[test]
    fn filtered_is_subset_of_loaded() {
        let recs: Vec<Record> = (1..=20)
            .map(|i| rec(i, None, if i % 2 == 0 { "已完成" } else { "运行中" }))
            .collect();
        for tab in ["all", "running", "completed", "stopped"] {
            for search in ["", "1", "任务", "x"] {
                let out = filter_records(
                    &recs,
                    ResourceKind::Tasks,
                    tab.parse().unwrap(),
                    search,
                );
                assert!(out.iter().all(|r| recs.iter().any(|l| l == *r)));
                let mut uniq: Vec<i64> = ids(&out);
                uniq.sort();
                uniq.dedup();
                assert_eq!(uniq.len(), out.len());
            }
        }
    }

    #[test]
    fn pagination_bounds_and_clamping() {
        assert_eq!(total_pages(0, 10), 1);
        assert_eq!(total_pages(10, 10), 1);
        assert_eq!(total_pages(11, 10), 2);
        assert_eq!(total_pages(5, 0), 5);

        let recs: Vec<Record> = (1..=23).map(|i| rec(i, None, "运行中")).collect();
        let mut view = ViewState::default();

        let first = run(&recs, ResourceKind::Tasks, &view, 10);
        assert_eq!((first.total_count, first.total_pages, first.page), (23, 3, 1));
        assert_eq!(first.items.len(), 10);
        assert_eq!(first.items[0].id, 23);

        view.page = 3;
        assert_eq!(run(&recs, ResourceKind::Tasks, &view, 10).items.len(), 3);

        view.page = 99;
        let clamped = run(&recs, ResourceKind::Tasks, &view, 10);
        assert_eq!(clamped.page, 3);
        assert_eq!(ids(&clamped.items), vec![3, 2, 1]);

        view.page = 0;
        assert_eq!(run(&recs, ResourceKind::Tasks, &view, 10).page, 1);

        let empty = run(&[], ResourceKind::Tasks, &view, 10);
        assert_eq!((empty.total_pages, empty.page, empty.items.len()), (1, 1, 0));
    }
}
