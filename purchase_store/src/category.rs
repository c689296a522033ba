//! Product category lookup by keyword.

/// Keyword tables checked in order; the first category containing a keyword
/// found in the product name wins.
const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "食品/飲料",
        &[
            "咖啡", "茶", "水", "飲料", "零食", "餅乾", "巧克力", "糖果", "米", "麵", "醬", "油",
            "鹽", "糖", "醋", "食品", "堅果", "牛奶", "優格", "果汁", "啤酒", "酒", "泡麵", "罐頭",
            "調味", "雞", "豬", "牛", "魚", "蝦", "肉", "蔬菜", "水果", "麵包", "蛋糕", "冰淇淋",
            "起司", "奶油",
        ],
    ),
    (
        "3C/電子",
        &[
            "手機", "耳機", "充電", "電池", "線材", "usb", "hdmi", "鍵盤", "滑鼠", "ipad",
            "iphone", "samsung", "平板", "記憶卡", "sd", "ssd", "硬碟", "螢幕", "音響", "喇叭",
            "airpods", "apple", "電腦", "筆電", "switch", "ps5", "相機", "鏡頭", "gopro", "投影",
            "路由器", "wifi",
        ],
    ),
    (
        "日用品/清潔",
        &[
            "衛生紙", "面紙", "洗衣", "洗碗", "清潔", "垃圾袋", "牙刷", "牙膏", "洗髮", "沐浴",
            "肥皂", "洗手", "拖把", "掃把", "刷子", "海綿", "漂白", "除臭", "柔軟", "芳香", "殺菌",
            "消毒",
        ],
    ),
    (
        "美妝/保養",
        &[
            "面膜", "化妝", "口紅", "眼影", "粉底", "防曬", "乳液", "精華", "卸妝", "保濕", "面霜",
            "護手", "香水", "指甲", "眉筆", "睫毛", "腮紅",
        ],
    ),
    (
        "服飾/配件",
        &[
            "衣", "褲", "裙", "外套", "帽", "襪", "鞋", "包包", "背包", "皮夾", "手錶", "項鍊",
            "耳環", "圍巾", "手套", "皮帶", "太陽眼鏡",
        ],
    ),
    (
        "居家/傢俱",
        &[
            "枕頭", "棉被", "床單", "毛巾", "窗簾", "地毯", "收納", "置物", "掛鉤", "燈", "蠟燭",
            "花瓶", "碗", "盤", "杯", "筷", "鍋", "刀", "砧板",
        ],
    ),
    (
        "健康/運動",
        &[
            "維他命", "保健", "營養", "蛋白", "益生菌", "口罩", "ok繃", "體溫", "血壓", "瑜珈",
            "啞鈴", "跑步", "運動", "健身",
        ],
    ),
    (
        "母嬰/寵物",
        &[
            "尿布", "奶瓶", "奶嘴", "嬰兒", "寶寶", "貓", "狗", "飼料", "貓砂", "寵物",
        ],
    ),
    (
        "書籍/文具",
        &[
            "書", "筆", "筆記本", "文具", "膠帶", "剪刀", "便利貼", "資料夾", "計算機",
        ],
    ),
];

pub const DEFAULT_CATEGORY: &str = "其他";

/// Maps a product name to a category label. Case-insensitive substring
/// match, first table entry wins, `其他` when nothing matches.
pub fn categorize(product_name: &str) -> &'static str {
    let name = product_name.to_lowercase();
    for (category, keywords) in CATEGORIES {
        if keywords.iter().any(|kw| name.contains(kw)) {
            return category;
        }
    }
    DEFAULT_CATEGORY
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_food_keywords() {
        assert_eq!(categorize("濾掛咖啡 10入"), "食品/飲料");
    }

    #[test]
    fn matches_electronics_case_insensitively() {
        assert_eq!(categorize("Apple AirPods Pro 2"), "3C/電子");
        assert_eq!(categorize("USB-C 充電線"), "3C/電子");
    }

    #[test]
    fn first_table_entry_wins_on_overlap() {
        // 牛奶 hits 食品 before anything else.
        assert_eq!(categorize("高鈣牛奶"), "食品/飲料");
    }

    #[test]
    fn unknown_name_falls_back() {
        assert_eq!(categorize("???"), DEFAULT_CATEGORY);
        assert_eq!(categorize(""), DEFAULT_CATEGORY);
    }
}
