// ==========================================
// 销售导入门户 - 上传格式注册表
// ==========================================
// 职责: 静态声明各上传类型的必需列
// 说明: 编译期常量，进程启动即可用，无生命周期
// ==========================================

use crate::domain::upload::UploadFormat;

/// POS 渠道匹配格式（唯一执行逐行分类入账的类型）
pub const PETPOOJA: &str = "petpooja";
pub const PAIN_LEBS: &str = "pain_lebs";
pub const WEBSITE: &str = "website";

const PETPOOJA_COLUMNS: &[&str] = &[
    "restaurant_name",
    "invoice_no",
    "date",
    "New Date",
    "Time",
    "payment_type",
    "order_type",
    "status",
    "area",
    "virtual_brand_name",
    "brand_grouping",
    "assign_to",
    "customer_phone",
    "customer_name",
    "customer_address",
    "persons",
    "order_cancel_reason",
    "my_amount",
    "total_tax",
    "discount",
    "delivery_charge",
    "container_charge",
    "service_charge",
    "additional_charge",
    "waived_off",
    "round_off",
    "total",
    "item_name",
    "category_name",
    "sap_code",
    "item_price",
    "item_quantity",
    "item_total",
    "Total",
];

const PAIN_LEBS_COLUMNS: &[&str] = &[
    "Store ID",
    "Store Name",
    "Region",
    "Customer Phone",
    "Customer Email",
    "Customer Name",
    "Customer address",
    "Customer GST Number",
    "Order ID",
    "Reference Order ID",
    "Invoice Number",
    "Product ID",
    "Order Sub ID",
    "Order Date",
    "Order Time",
    "Product",
    "Size",
    "Category",
    "Brand",
    "Sub Category",
    "Income Head",
    "Barcode",
    "SKU",
    "Batch Variant ID",
    "Batch Variant Name",
    "HSN / SAC Code",
    "Quantity Ordered",
    "Unit",
    "Base Price",
    "Net Sale",
    "Taxes",
    "Gross Sale",
    "Void Amount",
    "MRP",
    "Cost Price per Unit",
    "Cost Of Goods Sold",
    "Void Quantity",
    "Void Date",
    "Void Time",
    "User",
    "Billing User",
    "Manufacturer ID",
    "Manufacturer",
    "Discount Total Value",
    "Discount Remarks",
    "Discount IDs",
    "Discount Names",
    "Coupon Code",
    "Total Charge Value",
    "Payment Mode",
];

const WEBSITE_COLUMNS: &[&str] = &[
    "Page Title",
    "URL",
    "Visits",
    "Bounce Rate",
    "Avg Duration",
    "Date",
];

/// 全部上传格式
pub const UPLOAD_FORMATS: &[UploadFormat] = &[
    UploadFormat {
        upload_type: PETPOOJA,
        name: "Petpooja Upload",
        required_columns: PETPOOJA_COLUMNS,
        description: "Petpooja restaurant order data format with restaurant info, invoice details, order information, customer details, charges, and item details",
        channel_matching: true,
    },
    UploadFormat {
        upload_type: PAIN_LEBS,
        name: "Pain Labs Upload",
        required_columns: PAIN_LEBS_COLUMNS,
        description: "Pain Labs retail sales data format with store info, customer details, order information, product details, pricing, taxes, discounts, and payment information",
        channel_matching: false,
    },
    UploadFormat {
        upload_type: WEBSITE,
        name: "Website Upload",
        required_columns: WEBSITE_COLUMNS,
        description: "Website format with Page Title, URL, Visits, Bounce Rate, Avg Duration, and Date",
        channel_matching: false,
    },
];

/// 按上传类型查找格式（精确匹配）
pub fn find_format(upload_type: &str) -> Option<&'static UploadFormat> {
    UPLOAD_FORMATS.iter().find(|f| f.upload_type == upload_type)
}

/// 获取上传类型的必需列
///
/// # 返回
/// - None: 未注册的上传类型
pub fn get_required_columns(upload_type: &str) -> Option<&'static [&'static str]> {
    find_format(upload_type).map(|f| f.required_columns)
}
