/// Split a backlog list cell on `;` or `|`, trimming each token and dropping
/// empty ones.
pub fn split_list(cell: &str) -> Vec<String> {
    cell.split([';', '|'])
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(String::from)
        .collect()
}
