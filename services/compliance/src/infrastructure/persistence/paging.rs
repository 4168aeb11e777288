//! 整表读取

use hse_errors::AppResult;
use hse_ports::{FetchQuery, Record, RecordStore};

/// 每次请求的条数
pub const FETCH_PAGE_SIZE: u32 = 100;

/// 逐页读取全部匹配记录并转换
///
/// 不依赖响应中的 `total`：某页不足 `FETCH_PAGE_SIZE` 条即为最后一页
pub async fn fetch_all<S, T, F>(
    store: &S,
    table: &str,
    query: FetchQuery,
    decode: F,
) -> AppResult<Vec<T>>
where
    S: RecordStore + ?Sized,
    F: Fn(&Record) -> AppResult<T>,
{
    let mut items = Vec::new();
    let mut offset = 0u32;
    loop {
        let page = store
            .fetch_records(table, &query.clone().paging(FETCH_PAGE_SIZE, offset))
            .await?
            .into_records()?;
        for record in &page {
            items.push(decode(record)?);
        }
        if page.len() < FETCH_PAGE_SIZE as usize {
            return Ok(items);
        }
        offset = offset.saturating_add(FETCH_PAGE_SIZE);
    }
}
